//! Profile, weight log, widget preferences, and the settings row.

use anyhow::Result;

use crate::db::models::{PreviousPerformancePolicy, Profile, WeightEntry, WidgetPref};
use crate::db::operations::{
    all_weight_entries, delete_weight_entry, delete_widget_pref, get_previous_performance_policy,
    get_profile, get_widget_pref, set_previous_performance_policy, update_profile,
    update_profile_weight, update_weight_entry, upsert_widget_pref,
};
use crate::live::{Table, TableSet};
use crate::session::Session;

impl Session {
    pub async fn profile(&self) -> Result<Profile> {
        get_profile(&self.db_pool)
            .await?
            .ok_or_else(|| anyhow::anyhow!("profile row missing"))
    }

    pub async fn update_profile(
        &self,
        name: &str,
        height_cm: f64,
        body_fat_percent: Option<f64>,
    ) -> Result<Profile> {
        let profile =
            update_profile(&self.db_pool, name, height_cm, body_fat_percent, self.now()).await?;
        self.bus.publish(TableSet::of(&[Table::Profile]));
        Ok(profile)
    }

    /// The only write path for current weight: updates the profile field and
    /// appends the matching weight-log entry together.
    pub async fn update_weight(&self, weight_kg: f64) -> Result<WeightEntry> {
        let entry =
            update_profile_weight(&self.db_pool, weight_kg, &self.today(), self.now()).await?;
        self.bus
            .publish(TableSet::of(&[Table::Profile, Table::WeightEntries]));
        Ok(entry)
    }

    pub async fn weight_entries(&self) -> Result<Vec<WeightEntry>> {
        all_weight_entries(&self.db_pool).await
    }

    pub async fn edit_weight_entry(
        &self,
        entry_id: i64,
        weight: f64,
        date: &str,
    ) -> Result<WeightEntry> {
        let entry = update_weight_entry(&self.db_pool, entry_id, weight, date).await?;
        self.bus.publish(TableSet::of(&[Table::WeightEntries]));
        Ok(entry)
    }

    pub async fn delete_weight_entry(&self, entry_id: i64) -> Result<u64> {
        let deleted = delete_weight_entry(&self.db_pool, entry_id).await?;
        self.bus.publish(TableSet::of(&[Table::WeightEntries]));
        Ok(deleted)
    }

    pub async fn widget_pref(&self, widget_id: &str) -> Result<Option<WidgetPref>> {
        get_widget_pref(&self.db_pool, widget_id).await
    }

    pub async fn set_widget_pref(&self, widget_id: &str, glow_color: &str) -> Result<WidgetPref> {
        let pref = upsert_widget_pref(&self.db_pool, widget_id, glow_color, self.now()).await?;
        self.bus.publish(TableSet::of(&[Table::WidgetPrefs]));
        Ok(pref)
    }

    pub async fn clear_widget_pref(&self, widget_id: &str) -> Result<u64> {
        let deleted = delete_widget_pref(&self.db_pool, widget_id).await?;
        self.bus.publish(TableSet::of(&[Table::WidgetPrefs]));
        Ok(deleted)
    }

    pub async fn previous_performance_policy(&self) -> Result<PreviousPerformancePolicy> {
        get_previous_performance_policy(&self.db_pool).await
    }

    pub async fn set_previous_performance_policy(
        &self,
        policy: PreviousPerformancePolicy,
    ) -> Result<()> {
        set_previous_performance_policy(&self.db_pool, policy).await?;
        self.bus.publish(TableSet::of(&[Table::Settings]));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_pool;
    use crate::session::SessionConfig;
    use chrono::Local;

    async fn test_session() -> Session {
        Session::from_pool(test_pool().await, SessionConfig::default())
            .await
            .expect("session")
    }

    #[tokio::test]
    async fn weight_update_round_trips_through_profile_and_log() {
        let session = test_session().await;
        session.update_weight(82.5).await.unwrap();

        let profile = session.profile().await.unwrap();
        assert_eq!(profile.weight_kg, 82.5);

        let entries = session.weight_entries().await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].weight, 82.5);
        assert_eq!(
            entries[0].date,
            Local::now().date_naive().format("%Y-%m-%d").to_string()
        );
    }

    #[tokio::test]
    async fn widget_pref_upsert_overwrites_by_id() {
        let session = test_session().await;
        session.set_widget_pref("streak-card", "#ff9f1c").await.unwrap();
        session.set_widget_pref("streak-card", "#2ec4b6").await.unwrap();

        let pref = session.widget_pref("streak-card").await.unwrap().unwrap();
        assert_eq!(pref.glow_color, "#2ec4b6");

        session.clear_widget_pref("streak-card").await.unwrap();
        assert!(session.widget_pref("streak-card").await.unwrap().is_none());
    }
}
