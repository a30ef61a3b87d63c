use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

pub use super::types::{RequestStatus, ServiceType, UserRole};

// --- Users ---
pub mod user {
    use super::*;

    /// Back-office account: the usual authenticable fields plus phone and role.
    #[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, DeriveEntityModel, ToSchema)]
    #[sea_orm(table_name = "users")]
    pub struct Model {
        #[sea_orm(primary_key)]
        pub id: i64,
        #[sea_orm(unique, column_type = "String(StringLen::N(150))")]
        pub username: String,
        #[serde(skip_serializing)]
        pub password_hash: String,
        #[sea_orm(column_type = "String(StringLen::N(150))")]
        pub first_name: String,
        #[sea_orm(column_type = "String(StringLen::N(150))")]
        pub last_name: String,
        #[sea_orm(column_type = "String(StringLen::N(254))")]
        pub email: String,
        #[sea_orm(column_type = "String(StringLen::N(15))", nullable)]
        pub tel: Option<String>,
        pub role: UserRole,
        pub is_active: bool,
        pub is_staff: bool,
        pub is_superuser: bool,
        #[schema(value_type = String, format = DateTime)]
        pub date_joined: DateTimeUtc,
        #[schema(value_type = String, format = DateTime)]
        pub last_login: Option<DateTimeUtc>,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {}

    impl ActiveModelBehavior for ActiveModel {}

    impl std::fmt::Display for Model {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "{}-{}", self.username, self.role)
        }
    }
}

// --- Clients ---
pub mod client {
    use super::*;

    #[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, DeriveEntityModel, ToSchema)]
    #[sea_orm(table_name = "clients")]
    pub struct Model {
        #[sea_orm(primary_key)]
        pub id: i64,
        #[sea_orm(column_type = "String(StringLen::N(60))")]
        pub legal_entity: String,
        #[sea_orm(column_type = "String(StringLen::N(60))")]
        pub contact_person: String,
        #[sea_orm(column_type = "String(StringLen::N(12))")]
        pub phone_num: String,
        #[sea_orm(column_type = "String(StringLen::N(30))")]
        pub email: String,
        #[sea_orm(column_type = "String(StringLen::N(30))")]
        pub bank_details: String,
        #[sea_orm(column_type = "String(StringLen::N(12))", nullable)]
        pub old_phone: Option<String>,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {
        #[sea_orm(has_many = "super::request::Entity")]
        Request,
        #[sea_orm(has_many = "super::invoice::Entity")]
        Invoice,
        #[sea_orm(has_many = "super::payment_order::Entity")]
        PaymentOrder,
    }

    impl Related<super::request::Entity> for Entity {
        fn to() -> RelationDef {
            Relation::Request.def()
        }
    }

    impl Related<super::invoice::Entity> for Entity {
        fn to() -> RelationDef {
            Relation::Invoice.def()
        }
    }

    impl Related<super::payment_order::Entity> for Entity {
        fn to() -> RelationDef {
            Relation::PaymentOrder.def()
        }
    }

    impl ActiveModelBehavior for ActiveModel {}

    impl std::fmt::Display for Model {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "{}-{}", self.contact_person, self.legal_entity)
        }
    }
}

// --- Services Price List ---
pub mod service_pl {
    use super::*;

    #[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, DeriveEntityModel, ToSchema)]
    #[sea_orm(table_name = "services_price_list")]
    pub struct Model {
        #[sea_orm(primary_key)]
        pub id: i64,
        pub service_type: ServiceType,
        #[sea_orm(column_type = "String(StringLen::N(50))")]
        pub title: String,
        #[sea_orm(column_type = "Decimal(Some((12, 2)))")]
        #[schema(value_type = String)]
        pub price: Decimal,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {
        #[sea_orm(has_many = "super::chosen_service::Entity")]
        ChosenService,
    }

    impl Related<super::chosen_service::Entity> for Entity {
        fn to() -> RelationDef {
            Relation::ChosenService.def()
        }
    }

    impl ActiveModelBehavior for ActiveModel {}

    impl std::fmt::Display for Model {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.write_str(&self.title)
        }
    }
}

// --- Materials Price List ---
pub mod material_pl {
    use super::*;

    #[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, DeriveEntityModel, ToSchema)]
    #[sea_orm(table_name = "materials_price_list")]
    pub struct Model {
        #[sea_orm(primary_key)]
        pub id: i64,
        #[sea_orm(column_type = "String(StringLen::N(50))")]
        pub title: String,
        #[sea_orm(column_type = "String(StringLen::N(150))")]
        pub description: String,
        #[sea_orm(column_type = "Decimal(Some((12, 2)))")]
        #[schema(value_type = String)]
        pub price: Decimal,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {
        #[sea_orm(has_many = "super::chosen_material::Entity")]
        ChosenMaterial,
        #[sea_orm(has_many = "super::materials_photo::Entity")]
        MaterialsPhoto,
    }

    impl Related<super::chosen_material::Entity> for Entity {
        fn to() -> RelationDef {
            Relation::ChosenMaterial.def()
        }
    }

    impl Related<super::materials_photo::Entity> for Entity {
        fn to() -> RelationDef {
            Relation::MaterialsPhoto.def()
        }
    }

    impl ActiveModelBehavior for ActiveModel {}

    impl std::fmt::Display for Model {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.write_str(&self.title)
        }
    }
}

// --- Requests ---
pub mod request {
    use super::*;

    #[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, DeriveEntityModel, ToSchema)]
    #[sea_orm(table_name = "requests")]
    pub struct Model {
        #[sea_orm(primary_key)]
        pub id: i64,
        pub client_id: i64,
        #[schema(value_type = String, format = Date)]
        pub req_date: Date,
        #[sea_orm(column_type = "String(StringLen::N(30))")]
        pub workload: String,
        #[sea_orm(column_type = "Decimal(Some((12, 2)))")]
        #[schema(value_type = String)]
        pub final_price: Decimal,
        pub status: RequestStatus,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {
        #[sea_orm(
            belongs_to = "super::client::Entity",
            from = "Column::ClientId",
            to = "super::client::Column::Id",
            on_delete = "Cascade"
        )]
        Client,
        #[sea_orm(has_many = "super::chosen_service::Entity")]
        ChosenService,
        #[sea_orm(has_many = "super::chosen_material::Entity")]
        ChosenMaterial,
        #[sea_orm(has_many = "super::work_group::Entity")]
        WorkGroup,
        #[sea_orm(has_many = "super::invoice::Entity")]
        Invoice,
        #[sea_orm(has_many = "super::payment_order::Entity")]
        PaymentOrder,
    }

    impl Related<super::client::Entity> for Entity {
        fn to() -> RelationDef {
            Relation::Client.def()
        }
    }

    impl Related<super::chosen_service::Entity> for Entity {
        fn to() -> RelationDef {
            Relation::ChosenService.def()
        }
    }

    impl Related<super::chosen_material::Entity> for Entity {
        fn to() -> RelationDef {
            Relation::ChosenMaterial.def()
        }
    }

    impl Related<super::work_group::Entity> for Entity {
        fn to() -> RelationDef {
            Relation::WorkGroup.def()
        }
    }

    impl Related<super::invoice::Entity> for Entity {
        fn to() -> RelationDef {
            Relation::Invoice.def()
        }
    }

    impl Related<super::payment_order::Entity> for Entity {
        fn to() -> RelationDef {
            Relation::PaymentOrder.def()
        }
    }

    impl ActiveModelBehavior for ActiveModel {}

    impl Model {
        /// `<id>-<legal entity>-<date>`, the label used in listings.
        pub fn label(&self, client: &super::client::Model) -> String {
            format!("{}-{}-{}", self.id, client.legal_entity, self.req_date)
        }
    }
}

// --- Chosen Services ---
pub mod chosen_service {
    use super::*;

    #[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, DeriveEntityModel, ToSchema)]
    #[sea_orm(table_name = "chosen_services")]
    pub struct Model {
        #[sea_orm(primary_key)]
        pub id: i64,
        pub service_id: i64,
        pub request_id: i64,
        #[sea_orm(column_type = "Decimal(Some((12, 2)))")]
        #[schema(value_type = String)]
        pub total_cost: Decimal,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {
        #[sea_orm(
            belongs_to = "super::service_pl::Entity",
            from = "Column::ServiceId",
            to = "super::service_pl::Column::Id",
            on_delete = "Cascade"
        )]
        Service,
        #[sea_orm(
            belongs_to = "super::request::Entity",
            from = "Column::RequestId",
            to = "super::request::Column::Id",
            on_delete = "Cascade"
        )]
        Request,
    }

    impl Related<super::service_pl::Entity> for Entity {
        fn to() -> RelationDef {
            Relation::Service.def()
        }
    }

    impl Related<super::request::Entity> for Entity {
        fn to() -> RelationDef {
            Relation::Request.def()
        }
    }

    impl ActiveModelBehavior for ActiveModel {}
}

// --- Chosen Materials ---
pub mod chosen_material {
    use super::*;

    #[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, DeriveEntityModel, ToSchema)]
    #[sea_orm(table_name = "chosen_materials")]
    pub struct Model {
        #[sea_orm(primary_key)]
        pub id: i64,
        pub material_id: i64,
        pub request_id: i64,
        #[sea_orm(column_type = "Decimal(Some((12, 2)))")]
        #[schema(value_type = String)]
        pub total_cost: Decimal,
        /// Number of pieces.
        pub amount: i32,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {
        #[sea_orm(
            belongs_to = "super::material_pl::Entity",
            from = "Column::MaterialId",
            to = "super::material_pl::Column::Id",
            on_delete = "Cascade"
        )]
        Material,
        #[sea_orm(
            belongs_to = "super::request::Entity",
            from = "Column::RequestId",
            to = "super::request::Column::Id",
            on_delete = "Cascade"
        )]
        Request,
    }

    impl Related<super::material_pl::Entity> for Entity {
        fn to() -> RelationDef {
            Relation::Material.def()
        }
    }

    impl Related<super::request::Entity> for Entity {
        fn to() -> RelationDef {
            Relation::Request.def()
        }
    }

    impl ActiveModelBehavior for ActiveModel {}
}

// --- Executors ---
pub mod executor {
    use super::*;

    #[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, DeriveEntityModel, ToSchema)]
    #[sea_orm(table_name = "executors")]
    pub struct Model {
        #[sea_orm(primary_key)]
        pub id: i64,
        #[sea_orm(column_type = "String(StringLen::N(50))")]
        pub full_name: String,
        #[sea_orm(column_type = "String(StringLen::N(12))")]
        pub phone_num: String,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {
        #[sea_orm(has_many = "super::work_group::Entity")]
        WorkGroup,
    }

    impl Related<super::work_group::Entity> for Entity {
        fn to() -> RelationDef {
            Relation::WorkGroup.def()
        }
    }

    impl ActiveModelBehavior for ActiveModel {}

    impl std::fmt::Display for Model {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.write_str(&self.full_name)
        }
    }
}

// --- Work Groups ---
pub mod work_group {
    use super::*;

    #[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, DeriveEntityModel, ToSchema)]
    #[sea_orm(table_name = "work_groups")]
    pub struct Model {
        #[sea_orm(primary_key)]
        pub id: i64,
        pub request_id: i64,
        pub executor_id: i64,
        #[schema(value_type = String, format = Date)]
        pub start_date: Date,
        #[schema(value_type = String, format = Date)]
        pub end_date: Date,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {
        #[sea_orm(
            belongs_to = "super::request::Entity",
            from = "Column::RequestId",
            to = "super::request::Column::Id",
            on_delete = "Cascade"
        )]
        Request,
        #[sea_orm(
            belongs_to = "super::executor::Entity",
            from = "Column::ExecutorId",
            to = "super::executor::Column::Id",
            on_delete = "Cascade"
        )]
        Executor,
    }

    impl Related<super::request::Entity> for Entity {
        fn to() -> RelationDef {
            Relation::Request.def()
        }
    }

    impl Related<super::executor::Entity> for Entity {
        fn to() -> RelationDef {
            Relation::Executor.def()
        }
    }

    impl ActiveModelBehavior for ActiveModel {}
}

// --- Invoices ---
pub mod invoice {
    use super::*;

    #[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, DeriveEntityModel, ToSchema)]
    #[sea_orm(table_name = "invoices")]
    pub struct Model {
        #[sea_orm(primary_key)]
        pub id: i64,
        pub request_id: i64,
        pub client_id: i64,
        #[schema(value_type = String, format = Date)]
        pub pay_due: Date,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {
        #[sea_orm(
            belongs_to = "super::request::Entity",
            from = "Column::RequestId",
            to = "super::request::Column::Id",
            on_delete = "Cascade"
        )]
        Request,
        #[sea_orm(
            belongs_to = "super::client::Entity",
            from = "Column::ClientId",
            to = "super::client::Column::Id",
            on_delete = "Cascade"
        )]
        Client,
        #[sea_orm(has_many = "super::payment_order::Entity")]
        PaymentOrder,
    }

    impl Related<super::request::Entity> for Entity {
        fn to() -> RelationDef {
            Relation::Request.def()
        }
    }

    impl Related<super::client::Entity> for Entity {
        fn to() -> RelationDef {
            Relation::Client.def()
        }
    }

    impl Related<super::payment_order::Entity> for Entity {
        fn to() -> RelationDef {
            Relation::PaymentOrder.def()
        }
    }

    impl ActiveModelBehavior for ActiveModel {}

    impl Model {
        pub fn label(&self, client: &super::client::Model) -> String {
            format!("{}-{}", self.id, client.legal_entity)
        }
    }
}

// --- Payment Orders ---
pub mod payment_order {
    use super::*;

    #[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, DeriveEntityModel, ToSchema)]
    #[sea_orm(table_name = "payment_orders")]
    pub struct Model {
        #[sea_orm(primary_key)]
        pub id: i64,
        pub request_id: i64,
        pub client_id: i64,
        pub invoice_id: i64,
        #[schema(value_type = String, format = Date)]
        pub pay_date: Date,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {
        #[sea_orm(
            belongs_to = "super::request::Entity",
            from = "Column::RequestId",
            to = "super::request::Column::Id",
            on_delete = "Cascade"
        )]
        Request,
        #[sea_orm(
            belongs_to = "super::client::Entity",
            from = "Column::ClientId",
            to = "super::client::Column::Id",
            on_delete = "Cascade"
        )]
        Client,
        #[sea_orm(
            belongs_to = "super::invoice::Entity",
            from = "Column::InvoiceId",
            to = "super::invoice::Column::Id",
            on_delete = "Cascade"
        )]
        Invoice,
    }

    impl Related<super::request::Entity> for Entity {
        fn to() -> RelationDef {
            Relation::Request.def()
        }
    }

    impl Related<super::client::Entity> for Entity {
        fn to() -> RelationDef {
            Relation::Client.def()
        }
    }

    impl Related<super::invoice::Entity> for Entity {
        fn to() -> RelationDef {
            Relation::Invoice.def()
        }
    }

    impl ActiveModelBehavior for ActiveModel {}
}

// --- Materials Photos ---
pub mod materials_photo {
    use super::*;
    use sea_orm::ActiveValue;

    /// Uploaded file attached to a material. `filename` and `size` describe the
    /// stored file and are filled in by the photo service, never by callers.
    #[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, DeriveEntityModel, ToSchema)]
    #[sea_orm(table_name = "materials_photos")]
    pub struct Model {
        #[sea_orm(primary_key)]
        pub id: i64,
        pub material_id: i64,
        #[sea_orm(column_type = "String(StringLen::N(255))")]
        pub filename: String,
        pub size: i64,
        /// Storage path relative to the media root.
        #[sea_orm(column_type = "String(StringLen::N(255))")]
        pub file: String,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {
        #[sea_orm(
            belongs_to = "super::material_pl::Entity",
            from = "Column::MaterialId",
            to = "super::material_pl::Column::Id",
            on_delete = "Cascade"
        )]
        Material,
    }

    impl Related<super::material_pl::Entity> for Entity {
        fn to() -> RelationDef {
            Relation::Material.def()
        }
    }

    #[async_trait::async_trait]
    impl ActiveModelBehavior for ActiveModel {
        /// `filename` and `size` describe the file at `file`, so they only
        /// move together with it: a write that changes either one without a
        /// new `file` (or a new `file` without its size) is refused.
        async fn before_save<C>(mut self, _db: &C, insert: bool) -> Result<Self, DbErr>
        where
            C: ConnectionTrait,
        {
            let file_written = matches!(self.file, ActiveValue::Set(_));
            let size_written = matches!(self.size, ActiveValue::Set(_));
            let filename_written = matches!(self.filename, ActiveValue::Set(_));

            if insert && !(file_written && size_written) {
                return Err(DbErr::Custom(
                    "a photo needs its stored file and size".to_string(),
                ));
            }
            if !file_written && (size_written || filename_written) {
                return Err(DbErr::Custom(
                    "size and filename are derived from the stored file".to_string(),
                ));
            }
            if file_written && !size_written {
                return Err(DbErr::Custom(
                    "a new file must be saved together with its size".to_string(),
                ));
            }

            if let ActiveValue::Set(size) = &self.size {
                if *size < 0 {
                    return Err(DbErr::Custom("photo size cannot be negative".to_string()));
                }
            }
            if let ActiveValue::Set(file) | ActiveValue::Unchanged(file) = &self.file {
                self.filename = ActiveValue::Set(file.clone());
            }
            Ok(self)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn display_labels() {
        let client = client::Model {
            id: 3,
            legal_entity: "Vector LLC".to_string(),
            contact_person: "Anna Petrova".to_string(),
            phone_num: "+79990001122".to_string(),
            email: "anna@vector.ru".to_string(),
            bank_details: "40702810900000000001".to_string(),
            old_phone: None,
        };
        assert_eq!(client.to_string(), "Anna Petrova-Vector LLC");

        let request = request::Model {
            id: 12,
            client_id: 3,
            req_date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            workload: "two billboards".to_string(),
            final_price: Decimal::new(150000, 2),
            status: RequestStatus::Unpaid,
        };
        assert_eq!(request.label(&client), "12-Vector LLC-2024-03-01");

        let invoice = invoice::Model {
            id: 5,
            request_id: 12,
            client_id: 3,
            pay_due: NaiveDate::from_ymd_opt(2024, 3, 15).unwrap(),
        };
        assert_eq!(invoice.label(&client), "5-Vector LLC");
    }

    #[test]
    fn user_hides_password_hash() {
        let user = user::Model {
            id: 1,
            username: "olga".to_string(),
            password_hash: "$2b$12$secret".to_string(),
            first_name: "Olga".to_string(),
            last_name: "Ivanova".to_string(),
            email: "olga@agency.ru".to_string(),
            tel: None,
            role: UserRole::Manager,
            is_active: true,
            is_staff: false,
            is_superuser: false,
            date_joined: chrono::Utc::now(),
            last_login: None,
        };
        assert_eq!(user.to_string(), "olga-manager");
        let json = serde_json::to_value(&user).unwrap();
        assert!(json.get("password_hash").is_none());
    }
}
