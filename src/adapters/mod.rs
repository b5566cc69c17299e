// 外部系統的具體實作：arXiv feed、網頁搜尋、LLM
pub mod arxiv;
pub mod openai;
pub mod web_search;

pub use arxiv::ArxivSource;
pub use openai::OpenAiGenerator;
pub use web_search::WebSearchSource;
