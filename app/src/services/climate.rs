//! Climate observation management, CSV import and weather prefill

use chrono::NaiveDate;
use serde::Deserialize;
use shared::storage::{load_list, save_list};
use shared::{ClimateInput, ClimateObservation, StorageKey};
use std::io::Read;
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::external::{DailyWeather, Geocoder, WeatherHistory};
use crate::SharedStore;

#[derive(Clone)]
pub struct ClimateService {
    store: SharedStore,
    geocoder: Arc<dyn Geocoder>,
    weather: Arc<dyn WeatherHistory>,
}

/// One CSV row: `date,temperature,rainfall,humidity,windSpeed,solarRadiation[,location]`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CsvRow {
    date: NaiveDate,
    temperature: f64,
    rainfall: f64,
    humidity: f64,
    wind_speed: f64,
    solar_radiation: f64,
    #[serde(default)]
    location: Option<String>,
}

impl From<CsvRow> for ClimateInput {
    fn from(row: CsvRow) -> Self {
        ClimateInput {
            date: row.date,
            temperature: row.temperature,
            rainfall: row.rainfall,
            humidity: row.humidity,
            wind_speed: row.wind_speed,
            solar_radiation: row.solar_radiation,
            location: row.location.filter(|l| !l.trim().is_empty()),
        }
    }
}

impl ClimateService {
    pub fn new(
        store: SharedStore,
        geocoder: Arc<dyn Geocoder>,
        weather: Arc<dyn WeatherHistory>,
    ) -> Self {
        Self {
            store,
            geocoder,
            weather,
        }
    }

    /// All observations of a user, oldest first
    pub fn list(&self, user_id: Uuid) -> AppResult<Vec<ClimateObservation>> {
        let mut observations: Vec<ClimateObservation> =
            load_list(&*self.store, StorageKey::ClimateData(user_id))?;
        observations.sort_by_key(|o| o.date);
        Ok(observations)
    }

    pub fn create(&self, user_id: Uuid, input: ClimateInput) -> AppResult<ClimateObservation> {
        input.validate()?;

        let mut observations = self.list(user_id)?;
        let observation = ClimateObservation::new(user_id, input);
        observations.push(observation.clone());
        self.save(user_id, &observations)?;

        tracing::info!(user_id = %user_id, observation_id = %observation.id, date = %observation.date, "Climate observation created");
        Ok(observation)
    }

    pub fn update(
        &self,
        user_id: Uuid,
        observation_id: Uuid,
        input: ClimateInput,
    ) -> AppResult<ClimateObservation> {
        input.validate()?;

        let mut observations = self.list(user_id)?;
        let observation = observations
            .iter_mut()
            .find(|o| o.id == observation_id)
            .ok_or_else(|| AppError::NotFound("Climate observation".to_string()))?;
        observation.apply(input);
        let updated = observation.clone();
        self.save(user_id, &observations)?;

        tracing::info!(user_id = %user_id, observation_id = %observation_id, "Climate observation updated");
        Ok(updated)
    }

    pub fn delete(&self, user_id: Uuid, observation_id: Uuid) -> AppResult<()> {
        let mut observations = self.list(user_id)?;
        let before = observations.len();
        observations.retain(|o| o.id != observation_id);
        if observations.len() == before {
            return Err(AppError::NotFound("Climate observation".to_string()));
        }
        self.save(user_id, &observations)?;

        tracing::info!(user_id = %user_id, observation_id = %observation_id, "Climate observation deleted");
        Ok(())
    }

    /// Append every row of a CSV document. Nothing is stored unless every
    /// row parses and validates. Returns the number of rows imported.
    pub fn import_csv<R: Read>(&self, user_id: Uuid, reader: R) -> AppResult<usize> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(reader);

        let mut imported = Vec::new();
        for (index, result) in csv_reader.deserialize::<CsvRow>().enumerate() {
            let row_number = index + 1;
            let input: ClimateInput = result
                .map_err(|e| invalid_row(row_number, e.to_string()))?
                .into();
            input.validate().map_err(|errors| {
                invalid_row(row_number, shared::describe_validation_errors(&errors))
            })?;
            imported.push(ClimateObservation::new(user_id, input));
        }

        let count = imported.len();
        if count > 0 {
            let mut observations = self.list(user_id)?;
            observations.extend(imported);
            self.save(user_id, &observations)?;
        }

        tracing::info!(user_id = %user_id, rows = count, "Climate CSV imported");
        Ok(count)
    }

    /// Look up the day's weather for a free-text location
    pub async fn prefill(&self, location: &str, date: NaiveDate) -> AppResult<DailyWeather> {
        let coordinates = self
            .geocoder
            .locate(location)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Location '{}'", location.trim())))?;

        tracing::debug!(
            location,
            latitude = %coordinates.latitude,
            longitude = %coordinates.longitude,
            "Location geocoded"
        );

        self.weather
            .daily(&coordinates, date)
            .await?
            .ok_or_else(|| {
                AppError::ExternalServiceUnavailable(format!("No weather data for {}", date))
            })
    }

    fn save(&self, user_id: Uuid, observations: &[ClimateObservation]) -> AppResult<()> {
        save_list(&*self.store, StorageKey::ClimateData(user_id), observations)?;
        Ok(())
    }
}

fn invalid_row(row: usize, message: String) -> AppError {
    AppError::InvalidInput {
        field: format!("row {}", row),
        message,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use rust_decimal::Decimal;
    use shared::{GpsCoordinates, MemoryStore};

    struct NoGeocoder;

    #[async_trait]
    impl Geocoder for NoGeocoder {
        async fn locate(&self, _query: &str) -> AppResult<Option<GpsCoordinates>> {
            Ok(None)
        }
    }

    struct NoWeather;

    #[async_trait]
    impl WeatherHistory for NoWeather {
        async fn daily(&self, _: &GpsCoordinates, _: NaiveDate) -> AppResult<Option<DailyWeather>> {
            Ok(None)
        }
    }

    struct FixedGeocoder;

    #[async_trait]
    impl Geocoder for FixedGeocoder {
        async fn locate(&self, _query: &str) -> AppResult<Option<GpsCoordinates>> {
            Ok(Some(GpsCoordinates::new(Decimal::new(-3387, 3), Decimal::new(36683, 3))))
        }
    }

    fn service() -> ClimateService {
        ClimateService::new(Arc::new(MemoryStore::new()), Arc::new(NoGeocoder), Arc::new(NoWeather))
    }

    fn input(day: u32, temperature: f64) -> ClimateInput {
        ClimateInput {
            date: NaiveDate::from_ymd_opt(2024, 4, day).unwrap(),
            temperature,
            rainfall: 12.0,
            humidity: 75.0,
            wind_speed: 9.0,
            solar_radiation: 19.0,
            location: None,
        }
    }

    #[test]
    fn test_list_sorted_by_date() {
        let climate = service();
        let user = Uuid::new_v4();
        climate.create(user, input(20, 24.0)).unwrap();
        climate.create(user, input(3, 22.0)).unwrap();
        let dates: Vec<u32> = climate
            .list(user)
            .unwrap()
            .iter()
            .map(|o| chrono::Datelike::day(&o.date))
            .collect();
        assert_eq!(dates, vec![3, 20]);
    }

    #[test]
    fn test_humidity_over_100_rejected() {
        let climate = service();
        let mut bad = input(1, 24.0);
        bad.humidity = 120.0;
        assert!(matches!(climate.create(Uuid::new_v4(), bad), Err(AppError::Validation(_))));
    }

    #[test]
    fn test_import_csv() {
        let climate = service();
        let user = Uuid::new_v4();
        let data = "date,temperature,rainfall,humidity,windSpeed,solarRadiation,location\n\
                    2024-04-01,24.5,10.2,78,8.1,20.3,Arusha\n\
                    2024-04-02,25.0,0,70,7.5,22.0,\n";
        assert_eq!(climate.import_csv(user, data.as_bytes()).unwrap(), 2);

        let stored = climate.list(user).unwrap();
        assert_eq!(stored.len(), 2);
        assert_eq!(stored[0].location.as_deref(), Some("Arusha"));
        assert_eq!(stored[1].location, None);
    }

    #[test]
    fn test_import_without_location_column() {
        let climate = service();
        let user = Uuid::new_v4();
        let data = "date,temperature,rainfall,humidity,windSpeed,solarRadiation\n2024-04-01,24.5,10.2,78,8.1,20.3\n";
        assert_eq!(climate.import_csv(user, data.as_bytes()).unwrap(), 1);
    }

    #[test]
    fn test_bad_row_aborts_whole_import() {
        let climate = service();
        let user = Uuid::new_v4();
        let data = "date,temperature,rainfall,humidity,windSpeed,solarRadiation\n\
                    2024-04-01,24.5,10.2,78,8.1,20.3\n\
                    2024-04-02,hot,10.2,78,8.1,20.3\n";
        let err = climate.import_csv(user, data.as_bytes()).unwrap_err();
        assert!(matches!(err, AppError::InvalidInput { ref field, .. } if field == "row 2"));
        assert!(climate.list(user).unwrap().is_empty());
    }

    #[test]
    fn test_out_of_range_row_named() {
        let climate = service();
        let data = "date,temperature,rainfall,humidity,windSpeed,solarRadiation\n2024-04-01,24.5,-3,78,8.1,20.3\n";
        let err = climate.import_csv(Uuid::new_v4(), data.as_bytes()).unwrap_err();
        assert!(matches!(err, AppError::InvalidInput { ref field, .. } if field == "row 1"));
    }

    #[tokio::test]
    async fn test_prefill_unknown_location() {
        let climate = service();
        let date = NaiveDate::from_ymd_opt(2024, 4, 1).unwrap();
        assert!(matches!(climate.prefill("Atlantis", date).await, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_prefill_weather_unavailable() {
        let climate = ClimateService::new(
            Arc::new(MemoryStore::new()),
            Arc::new(FixedGeocoder),
            Arc::new(NoWeather),
        );
        let date = NaiveDate::from_ymd_opt(2024, 4, 1).unwrap();
        assert!(matches!(
            climate.prefill("Arusha", date).await,
            Err(AppError::ExternalServiceUnavailable(_))
        ));
    }
}
