pub mod topic_pipeline;

pub use topic_pipeline::TopicPipeline;
