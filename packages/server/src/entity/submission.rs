use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "submission")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub user_id: i32,

    pub problem_id: i32,
    #[sea_orm(belongs_to, from = "problem_id", to = "id")]
    pub problem: HasOne<super::problem::Entity>,

    pub language: String,
    #[sea_orm(column_type = "Text")]
    pub code: String,
    /// Execution backend token of the first test case.
    pub judge_token: Option<String>,
    /// Display label of the verdict, e.g. "Accepted" or "Runtime Error (SIGSEGV)".
    pub verdict: String,
    pub runtime_ms: Option<i32>,
    pub memory_kb: Option<i32>,
    #[sea_orm(column_type = "Text", nullable)]
    pub error_message: Option<String>,

    pub created_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
