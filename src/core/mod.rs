// 核心基础设施层
pub mod error;

pub use error::{AppError, AppResult};
