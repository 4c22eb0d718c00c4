//! CategoryRepository and MedicineRepository - the herbal shop catalogue

use super::{Create, Delete, Read, Update};
use crate::dtos::{CategoryDTO, CreateMedicineDTO, MedicineQuery, UpdateCategoryDTO, UpdateMedicineDTO, like_pattern};
use crate::entities::{Category, Medicine};
use chrono::Utc;
use sqlx::{Error, QueryBuilder, Sqlite, SqlitePool};
use tracing::{debug, info, instrument};

pub struct CategoryRepository {
    connection_pool: SqlitePool,
}

impl CategoryRepository {
    pub fn new(connection_pool: SqlitePool) -> Self {
        Self { connection_pool }
    }

    pub async fn find_all(&self) -> Result<Vec<Category>, Error> {
        sqlx::query_as::<_, Category>("SELECT category_id, name, description FROM categories ORDER BY name")
            .fetch_all(&self.connection_pool)
            .await
    }
}

impl Create<Category, CategoryDTO> for CategoryRepository {
    #[instrument(skip(self, data), fields(name = %data.name))]
    async fn create(&self, data: &CategoryDTO) -> Result<Category, Error> {
        let category = sqlx::query_as::<_, Category>(
            "INSERT INTO categories (name, description) VALUES (?, ?) RETURNING category_id, name, description",
        )
        .bind(data.name.trim())
        .bind(&data.description)
        .fetch_one(&self.connection_pool)
        .await?;
        info!("Category {} created", category.category_id);
        Ok(category)
    }
}

impl Read<Category, i64> for CategoryRepository {
    async fn read(&self, id: &i64) -> Result<Option<Category>, Error> {
        sqlx::query_as::<_, Category>("SELECT category_id, name, description FROM categories WHERE category_id = ?")
            .bind(id)
            .fetch_optional(&self.connection_pool)
            .await
    }
}

impl Update<Category, UpdateCategoryDTO, i64> for CategoryRepository {
    #[instrument(skip(self, data), fields(category_id = %id))]
    async fn update(&self, id: &i64, data: &UpdateCategoryDTO) -> Result<Category, Error> {
        let current = self.read(id).await?.ok_or(Error::RowNotFound)?;
        if data.name.is_none() && data.description.is_none() {
            return Ok(current);
        }

        let mut query_builder: QueryBuilder<Sqlite> = QueryBuilder::new("UPDATE categories SET ");
        let mut separated = query_builder.separated(", ");
        if let Some(ref name) = data.name {
            separated.push("name = ");
            separated.push_bind_unseparated(name.trim().to_string());
        }
        if let Some(ref description) = data.description {
            separated.push("description = ");
            separated.push_bind_unseparated(description.clone());
        }
        query_builder.push(" WHERE category_id = ");
        query_builder.push_bind(*id);
        query_builder.build().execute(&self.connection_pool).await?;

        self.read(id).await?.ok_or(Error::RowNotFound)
    }
}

impl Delete<i64> for CategoryRepository {
    /// Medicines in the category keep existing with no category
    #[instrument(skip(self), fields(category_id = %id))]
    async fn delete(&self, id: &i64) -> Result<(), Error> {
        let result = sqlx::query("DELETE FROM categories WHERE category_id = ?")
            .bind(id)
            .execute(&self.connection_pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(Error::RowNotFound);
        }
        info!("Category deleted");
        Ok(())
    }
}

const MEDICINE_COLUMNS: &str =
    "medicine_id, category_id, name, description, price_cents, stock, image_url, created_at";

pub struct MedicineRepository {
    connection_pool: SqlitePool,
}

impl MedicineRepository {
    pub fn new(connection_pool: SqlitePool) -> Self {
        Self { connection_pool }
    }

    #[instrument(skip(self))]
    pub async fn find_many(&self, query: &MedicineQuery) -> Result<Vec<Medicine>, Error> {
        debug!("Listing medicines");
        let mut builder: QueryBuilder<Sqlite> =
            QueryBuilder::new(format!("SELECT {MEDICINE_COLUMNS} FROM medicines WHERE 1 = 1"));

        if let Some(category_id) = query.category_id {
            builder.push(" AND category_id = ").push_bind(category_id);
        }
        if let Some(search) = query.search.as_deref().filter(|s| !s.trim().is_empty()) {
            builder
                .push(" AND name LIKE ")
                .push_bind(like_pattern(search))
                .push(" ESCAPE '\\'");
        }
        if query.in_stock == Some(true) {
            builder.push(" AND stock > 0");
        }
        builder
            .push(" ORDER BY name, medicine_id LIMIT ")
            .push_bind(query.limit())
            .push(" OFFSET ")
            .push_bind(query.offset());

        builder
            .build_query_as::<Medicine>()
            .fetch_all(&self.connection_pool)
            .await
    }
}

impl Create<Medicine, CreateMedicineDTO> for MedicineRepository {
    #[instrument(skip(self, data), fields(name = %data.name))]
    async fn create(&self, data: &CreateMedicineDTO) -> Result<Medicine, Error> {
        let sql = format!(
            "INSERT INTO medicines (category_id, name, description, price_cents, stock, image_url, created_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?) RETURNING {MEDICINE_COLUMNS}"
        );
        let medicine = sqlx::query_as::<_, Medicine>(&sql)
            .bind(data.category_id)
            .bind(data.name.trim())
            .bind(&data.description)
            .bind(data.price_cents)
            .bind(data.stock)
            .bind(&data.image_url)
            .bind(Utc::now())
            .fetch_one(&self.connection_pool)
            .await?;
        info!("Medicine {} created", medicine.medicine_id);
        Ok(medicine)
    }
}

impl Read<Medicine, i64> for MedicineRepository {
    async fn read(&self, id: &i64) -> Result<Option<Medicine>, Error> {
        let sql = format!("SELECT {MEDICINE_COLUMNS} FROM medicines WHERE medicine_id = ?");
        sqlx::query_as::<_, Medicine>(&sql)
            .bind(id)
            .fetch_optional(&self.connection_pool)
            .await
    }
}

impl Update<Medicine, UpdateMedicineDTO, i64> for MedicineRepository {
    #[instrument(skip(self, data), fields(medicine_id = %id))]
    async fn update(&self, id: &i64, data: &UpdateMedicineDTO) -> Result<Medicine, Error> {
        let current = self.read(id).await?.ok_or(Error::RowNotFound)?;
        if data.category_id.is_none()
            && data.name.is_none()
            && data.description.is_none()
            && data.price_cents.is_none()
            && data.stock.is_none()
            && data.image_url.is_none()
        {
            return Ok(current);
        }

        let mut query_builder: QueryBuilder<Sqlite> = QueryBuilder::new("UPDATE medicines SET ");
        let mut separated = query_builder.separated(", ");
        if let Some(category_id) = data.category_id {
            separated.push("category_id = ");
            separated.push_bind_unseparated(category_id);
        }
        if let Some(ref name) = data.name {
            separated.push("name = ");
            separated.push_bind_unseparated(name.trim().to_string());
        }
        if let Some(ref description) = data.description {
            separated.push("description = ");
            separated.push_bind_unseparated(description.clone());
        }
        if let Some(price_cents) = data.price_cents {
            separated.push("price_cents = ");
            separated.push_bind_unseparated(price_cents);
        }
        if let Some(stock) = data.stock {
            separated.push("stock = ");
            separated.push_bind_unseparated(stock);
        }
        if let Some(ref image_url) = data.image_url {
            separated.push("image_url = ");
            separated.push_bind_unseparated(image_url.clone());
        }
        query_builder.push(" WHERE medicine_id = ");
        query_builder.push_bind(*id);
        query_builder.build().execute(&self.connection_pool).await?;
        info!("Medicine updated");

        self.read(id).await?.ok_or(Error::RowNotFound)
    }
}

impl Delete<i64> for MedicineRepository {
    /// Fails with a foreign key violation while an order references the medicine
    #[instrument(skip(self), fields(medicine_id = %id))]
    async fn delete(&self, id: &i64) -> Result<(), Error> {
        let result = sqlx::query("DELETE FROM medicines WHERE medicine_id = ?")
            .bind(id)
            .execute(&self.connection_pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(Error::RowNotFound);
        }
        info!("Medicine deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn medicine(name: &str, category_id: Option<i64>, stock: i64) -> CreateMedicineDTO {
        CreateMedicineDTO {
            category_id,
            name: name.to_string(),
            description: None,
            price_cents: 25_000,
            stock,
            image_url: None,
        }
    }

    #[sqlx::test]
    async fn medicine_filters_combine(pool: SqlitePool) -> sqlx::Result<()> {
        let categories = CategoryRepository::new(pool.clone());
        let medicines = MedicineRepository::new(pool);
        let churna = categories
            .create(&CategoryDTO { name: "Churna".to_string(), description: None })
            .await?;

        medicines.create(&medicine("Triphala Churna", Some(churna.category_id), 10)).await?;
        medicines.create(&medicine("Hingvastak Churna", Some(churna.category_id), 0)).await?;
        medicines.create(&medicine("Chyawanprash", None, 5)).await?;

        let in_category = medicines
            .find_many(&MedicineQuery { category_id: Some(churna.category_id), ..Default::default() })
            .await?;
        assert_eq!(in_category.len(), 2);

        let available = medicines
            .find_many(&MedicineQuery {
                category_id: Some(churna.category_id),
                in_stock: Some(true),
                ..Default::default()
            })
            .await?;
        assert_eq!(available.len(), 1);
        assert_eq!(available[0].name, "Triphala Churna");

        let searched = medicines
            .find_many(&MedicineQuery { search: Some("chyawan".to_string()), ..Default::default() })
            .await?;
        assert_eq!(searched.len(), 1);
        Ok(())
    }

    #[sqlx::test]
    async fn deleting_category_detaches_medicines(pool: SqlitePool) -> sqlx::Result<()> {
        let categories = CategoryRepository::new(pool.clone());
        let medicines = MedicineRepository::new(pool);
        let oils = categories
            .create(&CategoryDTO { name: "Oils".to_string(), description: None })
            .await?;
        let oil = medicines.create(&medicine("Mahanarayan Oil", Some(oils.category_id), 3)).await?;

        categories.delete(&oils.category_id).await?;

        let reloaded = medicines.read(&oil.medicine_id).await?.unwrap();
        assert_eq!(reloaded.category_id, None);
        Ok(())
    }

    #[sqlx::test]
    async fn pagination_limits_results(pool: SqlitePool) -> sqlx::Result<()> {
        let medicines = MedicineRepository::new(pool);
        for name in ["Amla", "Brahmi", "Guduchi", "Neem"] {
            medicines.create(&medicine(name, None, 1)).await?;
        }

        let page = medicines
            .find_many(&MedicineQuery { limit: Some(2), offset: Some(1), ..Default::default() })
            .await?;
        let names: Vec<_> = page.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["Brahmi", "Guduchi"]);
        Ok(())
    }
}
