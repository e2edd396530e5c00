pub mod openai;

pub use openai::OpenAiChatClient;
