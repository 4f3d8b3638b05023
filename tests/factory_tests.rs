//! Provider resolution and factory tests.

use vidforge::{
    create_video_client_with_settings, supported_providers, ClientOptions, Provider, Settings,
    VideoClient, VideoGenError,
};

fn full_settings() -> Settings {
    Settings::default()
        .with_replicate_api_token("r8_test")
        .with_google_api_key("google-test")
}

#[test]
fn test_every_supported_provider_builds_matching_client() {
    let settings = full_settings();
    for provider in supported_providers() {
        let client = create_video_client_with_settings(
            provider,
            &settings,
            ClientOptions::new().model("owner/model"),
        )
        .unwrap_or_else(|e| panic!("{provider} failed: {e}"));
        assert_eq!(client.provider(), provider);
    }
}

#[test]
fn test_string_and_enum_identifiers_are_equivalent() {
    let settings = full_settings();
    let from_str = create_video_client_with_settings(
        "replicate",
        &settings,
        ClientOptions::new().model("bytedance/seedance-1-lite"),
    )
    .unwrap();
    let from_enum = create_video_client_with_settings(
        Provider::Replicate,
        &settings,
        ClientOptions::new().model("bytedance/seedance-1-lite"),
    )
    .unwrap();
    assert_eq!(from_str.provider(), from_enum.provider());
    assert_eq!(from_str.model(), "bytedance/seedance-1-lite");
}

#[test]
fn test_unknown_identifier_lists_supported_providers() {
    let err = create_video_client_with_settings("runway", &full_settings(), ClientOptions::new())
        .err()
        .unwrap();
    match &err {
        VideoGenError::UnsupportedProvider { provider, supported } => {
            assert_eq!(provider, "runway");
            let expected: Vec<String> = supported_providers()
                .into_iter()
                .map(|p| p.as_str().to_string())
                .collect();
            assert_eq!(supported, &expected);
        }
        other => panic!("unexpected error: {other}"),
    }
    for p in supported_providers() {
        assert!(err.to_string().contains(p.as_str()));
    }
}

#[test]
fn test_known_but_unwired_provider_is_unsupported() {
    let err = create_video_client_with_settings(Provider::OpenAi, &full_settings(), ClientOptions::new())
        .err()
        .unwrap();
    assert!(matches!(err, VideoGenError::UnsupportedProvider { ref provider, .. } if provider == "openai"));
}

#[test]
fn test_missing_credentials_fail_before_construction() {
    let settings = Settings::default().with_google_api_key("google-test");
    let err = create_video_client_with_settings(
        "replicate",
        &settings,
        ClientOptions::new().model("owner/model"),
    )
    .err()
    .unwrap();
    assert!(matches!(err, VideoGenError::Credential(_)));
}

#[test]
fn test_replicate_requires_model() {
    let err = create_video_client_with_settings("replicate", &full_settings(), ClientOptions::new())
        .err()
        .unwrap();
    assert!(matches!(err, VideoGenError::InvalidInput(_)));
}

#[test]
fn test_google_uses_default_model() {
    let client =
        create_video_client_with_settings("google", &full_settings(), ClientOptions::new()).unwrap();
    assert_eq!(client.model(), "veo-3.0-generate-preview");
    assert_eq!(client.name(), "Veo (Google)");
}
