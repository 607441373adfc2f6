//! City storage for the guarded CRUD resource.

use sqlx::sqlite::SqlitePool;

#[derive(Clone)]
pub struct CityStore {
    pool: SqlitePool,
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, sqlx::FromRow)]
pub struct City {
    #[sqlx(rename = "uuid")]
    pub city_id: String,
    #[sqlx(rename = "name")]
    pub city_name: String,
}

impl CityStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// List all cities in insertion order.
    pub async fn list(&self) -> Result<Vec<City>, sqlx::Error> {
        sqlx::query_as("SELECT uuid, name FROM cities ORDER BY id")
            .fetch_all(&self.pool)
            .await
    }

    /// List city names alphabetically.
    pub async fn list_names(&self) -> Result<Vec<String>, sqlx::Error> {
        let rows: Vec<(String,)> = sqlx::query_as("SELECT name FROM cities ORDER BY name, id")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(|(name,)| name).collect())
    }

    pub async fn get(&self, uuid: &str) -> Result<Option<City>, sqlx::Error> {
        sqlx::query_as("SELECT uuid, name FROM cities WHERE uuid = ?")
            .bind(uuid)
            .fetch_optional(&self.pool)
            .await
    }

    pub async fn create(&self, uuid: &str, name: &str) -> Result<City, sqlx::Error> {
        sqlx::query("INSERT INTO cities (uuid, name) VALUES (?, ?)")
            .bind(uuid)
            .bind(name)
            .execute(&self.pool)
            .await?;
        Ok(City {
            city_id: uuid.to_string(),
            city_name: name.to_string(),
        })
    }

    /// Rename a city. Returns false if it does not exist.
    pub async fn update(&self, uuid: &str, name: &str) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("UPDATE cities SET name = ? WHERE uuid = ?")
            .bind(name)
            .bind(uuid)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Delete a city. Returns false if it does not exist.
    pub async fn delete(&self, uuid: &str) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM cities WHERE uuid = ?")
            .bind(uuid)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
