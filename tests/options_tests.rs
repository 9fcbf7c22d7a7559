use std::time::Duration;
use toolcall::options::{ModelOptions, RetryPolicy, TransportOptions};
use toolcall::providers::LmStudioModel;

#[test]
fn test_transport_options_builder() {
    let options = TransportOptions::new()
        .with_timeout(Duration::from_secs(30))
        .with_proxy("http://proxy.example.com".to_string())
        .with_header("X-Custom-Header".to_string(), "Value".to_string())
        .with_retries(3, Duration::from_millis(100));

    match options {
        TransportOptions::Http {
            timeout,
            proxy,
            headers,
            retry,
        } => {
            assert_eq!(timeout, Some(Duration::from_secs(30)));
            assert_eq!(proxy, Some("http://proxy.example.com".to_string()));

            let headers = headers.unwrap();
            assert_eq!(headers.get("X-Custom-Header"), Some(&"Value".to_string()));

            assert_eq!(retry.max_retries, 3);
            assert_eq!(retry.initial_backoff, Duration::from_millis(100));
        }
    }
}

#[test]
fn test_transport_defaults_do_not_retry() {
    let options = TransportOptions::default();
    assert_eq!(options.retry_policy(), RetryPolicy::default());
    assert_eq!(options.retry_policy().max_retries, 0);
}

#[test]
fn test_model_options_new() {
    let options: ModelOptions<LmStudioModel> = ModelOptions::new("llama-3.2-3b-instruct");

    assert_eq!(options.model, "llama-3.2-3b-instruct");
    assert_eq!(options.system, None);
    assert_eq!(options.temperature, None);
    assert_eq!(options.max_tokens, None);
}

#[test]
fn test_model_options_custom() {
    let mut options = ModelOptions::<LmStudioModel>::new("llama-3.2-3b-instruct")
        .with_system("Sum the prices.");
    options.temperature = Some(0.2);
    options.max_tokens = Some(256);

    assert_eq!(options.system.as_deref(), Some("Sum the prices."));
    assert_eq!(options.temperature, Some(0.2));
    assert_eq!(options.max_tokens, Some(256));
}
