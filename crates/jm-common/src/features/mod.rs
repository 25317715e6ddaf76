pub mod encoder;
pub mod model;
pub mod multi_hot;
pub mod predictor;
pub mod schema;

pub use encoder::{CategoricalEncoder, LabelEncoder, TargetEncoder};
pub use model::GradientBoostedModel;
pub use multi_hot::SkillEncoder;
pub use predictor::{PredictError, SalaryPredictor};
pub use schema::{FeatureSchema, SchemaDiff};
