use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::{Client, RequestBuilder};
use serde::Deserialize;
use serde_json::Value;

use super::ReadingStore;
use crate::clock::{format_reading_date, parse_reading_date};
use crate::config::Config;
use crate::constants::tables::{DAILY_READINGS, USER_STREAKS};
use crate::error::{Error, Result};
use crate::reading::{ReadingDay, SectionMap, StreakState};
use crate::types::UserId;

const REST_PATH: &str = "/rest/v1";
const UPSERT_PREFER: &str = "resolution=merge-duplicates,return=representation";

/// Row shape of `daily_readings`. The stored `completed` column is ignored
/// and recomputed from the section map.
#[derive(Debug, Deserialize)]
struct ReadingDayRow {
    user_id: String,
    reading_date: String,
    #[serde(default)]
    sections_completed: SectionMap,
}

impl ReadingDayRow {
    fn into_day(self) -> Result<ReadingDay> {
        let date = parse_reading_date(&self.reading_date)
            .map_err(|e| Error::parse(format!("Bad reading_date in row: {e}")))?;
        Ok(ReadingDay::new(UserId::new(self.user_id), date, self.sections_completed))
    }
}

/// Client for the Supabase REST interface
#[derive(Clone)]
pub struct SupabaseStore {
    base_url: String,
    api_key: String,
    client: Client,
}

impl SupabaseStore {
    /// Create a new Supabase store from config
    pub fn new(config: &Config) -> Result<Self> {
        if !config.has_supabase_credentials() {
            return Err(Error::config(
                "Supabase store not configured",
                "Set SUPABASE_URL and SUPABASE_KEY environment variables",
            ));
        }
        let client = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| Error::config(format!("HTTP client setup failed: {e}"), "Check TLS configuration"))?;
        Ok(Self {
            base_url: format!("{}{}", config.supabase_url, REST_PATH),
            api_key: config.supabase_key.clone(),
            client,
        })
    }

    fn request(&self, builder: RequestBuilder) -> RequestBuilder {
        builder
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
            .header("Content-Type", "application/json")
    }

    /// Send a request and decode the JSON body
    async fn send(&self, table: &str, builder: RequestBuilder) -> Result<Value> {
        let resp = self
            .request(builder)
            .send()
            .await
            .map_err(|e| Error::unavailable(format!("Request to {table} failed: {e}")))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::storage_status(
                format!("Request to {table} returned {status}: {body}"),
                status.as_u16(),
            ));
        }

        resp.json()
            .await
            .map_err(|e| Error::parse(format!("Invalid JSON from {table}: {e}")))
    }

    async fn select(&self, table: &str, query: &[(&str, String)]) -> Result<Value> {
        let url = format!("{}/{}", self.base_url, table);
        self.send(table, self.client.get(&url).query(&[("select", "*")]).query(query))
            .await
    }

    async fn upsert(&self, table: &str, on_conflict: &str, body: &Value) -> Result<Value> {
        let url = format!("{}/{}", self.base_url, table);
        let builder = self
            .client
            .post(&url)
            .query(&[("on_conflict", on_conflict)])
            .header("Prefer", UPSERT_PREFER)
            .json(body);
        self.send(table, builder).await
    }
}

#[async_trait]
impl ReadingStore for SupabaseStore {
    async fn get_status(&self, user_id: &UserId, date: NaiveDate) -> Result<Option<ReadingDay>> {
        let json = self
            .select(DAILY_READINGS, &[
                ("user_id", format!("eq.{user_id}")),
                ("reading_date", format!("eq.{}", format_reading_date(date))),
            ])
            .await?;
        Ok(parse_day_rows(json)?.into_iter().next())
    }

    async fn upsert_status(&self, day: &ReadingDay) -> Result<ReadingDay> {
        let body = serde_json::to_value(day)?;
        let json = self.upsert(DAILY_READINGS, "user_id,reading_date", &body).await?;
        parse_day_rows(json)?
            .into_iter()
            .next()
            .ok_or_else(|| Error::parse("Upsert of daily reading returned no row"))
    }

    async fn list_status(
        &self,
        user_id: &UserId,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<ReadingDay>> {
        let json = self
            .select(DAILY_READINGS, &[
                ("user_id", format!("eq.{user_id}")),
                ("reading_date", format!("gte.{}", format_reading_date(from))),
                ("reading_date", format!("lte.{}", format_reading_date(to))),
                ("order", "reading_date.asc".to_string()),
            ])
            .await?;
        parse_day_rows(json)
    }

    async fn get_streak(&self, user_id: &UserId) -> Result<Option<StreakState>> {
        let json = self
            .select(USER_STREAKS, &[("user_id", format!("eq.{user_id}"))])
            .await?;
        Ok(parse_streak_rows(json)?.into_iter().next())
    }

    async fn put_streak(&self, state: &StreakState) -> Result<StreakState> {
        let body = serde_json::to_value(state)?;
        let json = self.upsert(USER_STREAKS, "user_id", &body).await?;
        parse_streak_rows(json)?
            .into_iter()
            .next()
            .ok_or_else(|| Error::parse("Upsert of streak returned no row"))
    }
}

/// Decode a PostgREST array of `daily_readings` rows
fn parse_day_rows(json: Value) -> Result<Vec<ReadingDay>> {
    let rows: Vec<ReadingDayRow> = serde_json::from_value(json)?;
    rows.into_iter().map(ReadingDayRow::into_day).collect()
}

/// Decode a PostgREST array of `user_streaks` rows
fn parse_streak_rows(json: Value) -> Result<Vec<StreakState>> {
    Ok(serde_json::from_value(json)?)
}
