//! Built-in exercise catalog, seeded into an empty store on first run.

use anyhow::Result;
use log::info;
use sqlx::SqlitePool;

use crate::db::models::NewExercise;
use crate::db::operations::{count_exercises, create_exercise};

pub struct SeedExercise {
    pub name: &'static str,
    pub muscle_group: &'static str,
    pub sub_muscle_group: Option<&'static str>,
    pub equipment: Option<&'static str>,
    pub aliases: Option<&'static str>,
}

pub const SEED_EXERCISES: &[SeedExercise] = &[
    SeedExercise {
        name: "Barbell Bench Press",
        muscle_group: "Chest",
        sub_muscle_group: Some("Mid Chest"),
        equipment: Some("Barbell"),
        aliases: Some("Bench Press, Flat Bench"),
    },
    SeedExercise {
        name: "Incline Dumbbell Press",
        muscle_group: "Chest",
        sub_muscle_group: Some("Upper Chest"),
        equipment: Some("Dumbbell"),
        aliases: None,
    },
    SeedExercise {
        name: "Cable Fly",
        muscle_group: "Chest",
        sub_muscle_group: Some("Mid Chest"),
        equipment: Some("Cable"),
        aliases: Some("Cable Crossover"),
    },
    SeedExercise {
        name: "Push Up",
        muscle_group: "Chest/Triceps",
        sub_muscle_group: None,
        equipment: None,
        aliases: Some("Pushup"),
    },
    SeedExercise {
        name: "Deadlift",
        muscle_group: "Back/Hamstrings",
        sub_muscle_group: Some("Lower Back"),
        equipment: Some("Barbell"),
        aliases: Some("Conventional Deadlift"),
    },
    SeedExercise {
        name: "Pull Up",
        muscle_group: "Back/Biceps",
        sub_muscle_group: Some("Lats"),
        equipment: Some("Bodyweight"),
        aliases: Some("Pullup, Chin Up"),
    },
    SeedExercise {
        name: "Barbell Row",
        muscle_group: "Back",
        sub_muscle_group: Some("Mid Back"),
        equipment: Some("Barbell"),
        aliases: Some("Bent Over Row"),
    },
    SeedExercise {
        name: "Lat Pulldown",
        muscle_group: "Back",
        sub_muscle_group: Some("Lats"),
        equipment: Some("Cable"),
        aliases: None,
    },
    SeedExercise {
        name: "Seated Cable Row",
        muscle_group: "Back",
        sub_muscle_group: Some("Mid Back"),
        equipment: Some("Cable"),
        aliases: None,
    },
    SeedExercise {
        name: "Overhead Press",
        muscle_group: "Shoulders",
        sub_muscle_group: Some("Front Delts"),
        equipment: Some("Barbell"),
        aliases: Some("OHP, Military Press"),
    },
    SeedExercise {
        name: "Lateral Raise",
        muscle_group: "Shoulders",
        sub_muscle_group: Some("Side Delts"),
        equipment: Some("Dumbbell"),
        aliases: Some("Side Raise"),
    },
    SeedExercise {
        name: "Face Pull",
        muscle_group: "Shoulders/Back",
        sub_muscle_group: Some("Rear Delts"),
        equipment: Some("Cable"),
        aliases: None,
    },
    SeedExercise {
        name: "Barbell Curl",
        muscle_group: "Biceps",
        sub_muscle_group: None,
        equipment: Some("Barbell"),
        aliases: None,
    },
    SeedExercise {
        name: "Hammer Curl",
        muscle_group: "Biceps",
        sub_muscle_group: Some("Brachialis"),
        equipment: Some("Dumbbell"),
        aliases: None,
    },
    SeedExercise {
        name: "Triceps Pushdown",
        muscle_group: "Triceps",
        sub_muscle_group: None,
        equipment: Some("Cable"),
        aliases: Some("Rope Pushdown"),
    },
    SeedExercise {
        name: "Skull Crusher",
        muscle_group: "Triceps",
        sub_muscle_group: Some("Long Head"),
        equipment: Some("Barbell"),
        aliases: Some("Lying Triceps Extension"),
    },
    SeedExercise {
        name: "Barbell Back Squat",
        muscle_group: "Quads/Glutes",
        sub_muscle_group: None,
        equipment: Some("Barbell"),
        aliases: Some("Squat, Back Squat"),
    },
    SeedExercise {
        name: "Front Squat",
        muscle_group: "Quads",
        sub_muscle_group: None,
        equipment: Some("Barbell"),
        aliases: None,
    },
    SeedExercise {
        name: "Leg Press",
        muscle_group: "Quads/Glutes",
        sub_muscle_group: None,
        equipment: Some("Machine"),
        aliases: None,
    },
    SeedExercise {
        name: "Romanian Deadlift",
        muscle_group: "Hamstrings/Glutes",
        sub_muscle_group: None,
        equipment: Some("Barbell"),
        aliases: Some("RDL"),
    },
    SeedExercise {
        name: "Leg Curl",
        muscle_group: "Hamstrings",
        sub_muscle_group: None,
        equipment: Some("Machine"),
        aliases: Some("Lying Leg Curl"),
    },
    SeedExercise {
        name: "Hip Thrust",
        muscle_group: "Glutes",
        sub_muscle_group: None,
        equipment: Some("Barbell"),
        aliases: None,
    },
    SeedExercise {
        name: "Bulgarian Split Squat",
        muscle_group: "Quads/Glutes",
        sub_muscle_group: None,
        equipment: Some("Dumbbell"),
        aliases: Some("Rear Foot Elevated Split Squat"),
    },
    SeedExercise {
        name: "Standing Calf Raise",
        muscle_group: "Calves",
        sub_muscle_group: None,
        equipment: Some("Machine"),
        aliases: Some("Calf Raise"),
    },
    SeedExercise {
        name: "Plank",
        muscle_group: "Core",
        sub_muscle_group: None,
        equipment: None,
        aliases: None,
    },
    SeedExercise {
        name: "Hanging Leg Raise",
        muscle_group: "Core",
        sub_muscle_group: Some("Lower Abs"),
        equipment: Some("Bodyweight"),
        aliases: None,
    },
    SeedExercise {
        name: "Cable Crunch",
        muscle_group: "Core",
        sub_muscle_group: Some("Upper Abs"),
        equipment: Some("Cable"),
        aliases: Some("Kneeling Cable Crunch"),
    },
];

/// Seed the built-in catalog into an empty exercises table. Skipped entirely
/// if the user already has any exercise rows, so custom edits to seeded
/// entries survive restarts.
pub async fn seed_exercises(pool: &SqlitePool) -> Result<u64> {
    if count_exercises(pool).await? > 0 {
        return Ok(0);
    }

    let mut created = 0u64;
    for seed in SEED_EXERCISES {
        create_exercise(
            pool,
            &NewExercise {
                name: seed.name.to_string(),
                muscle_group: seed.muscle_group.to_string(),
                sub_muscle_group: seed.sub_muscle_group.map(str::to_string),
                equipment: seed.equipment.map(str::to_string),
                aliases: seed.aliases.map(str::to_string),
                is_custom: false,
            },
        )
        .await?;
        created += 1;
    }
    info!("seeded {created} built-in exercises");
    Ok(created)
}
