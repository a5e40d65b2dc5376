//! 基础设施层
//!
//! 持有稀缺资源（HTTP 连接池），只暴露"发请求、拿 JSON"的能力，不认识题目和答案。

pub mod cancel;
pub mod http_executor;

pub use cancel::CancelToken;
pub use http_executor::HttpExecutor;
