use toolcall::client::Client;
use toolcall::model::{Message, Role};
use toolcall::providers::{LmStudio, Ollama, OpenAi, Provider};

#[test]
fn test_client_creation() {
    let client = LmStudio::create("lm-studio".to_string());
    assert_eq!(client.model_options().model, "llama-3.2-3b-instruct");
    assert_eq!(client.base_url(), "http://localhost:1234");

    let client = Ollama::at("http://gpu-box:11434/".to_string());
    assert_eq!(client.base_url(), "http://gpu-box:11434");
    assert_eq!(client.model_options().model, "llama3.2");

    let client = OpenAi::create("test-key".to_string());
    assert_eq!(client.base_url(), "https://api.openai.com");
}

#[test]
fn test_message_construction() {
    let msg = Message::user("Hello");
    assert_eq!(msg.role(), Role::User);
    assert_eq!(msg.content(), Some("Hello"));
    assert!(msg.tool_calls().is_empty());

    let msg = Message::tool("call_1", r#"{"ok":true}"#);
    assert_eq!(msg.role(), Role::Tool);
    if let Message::Tool { tool_call_id, .. } = msg {
        assert_eq!(tool_call_id, "call_1");
    } else {
        panic!("Expected Tool message");
    }
}
