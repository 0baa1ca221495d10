// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
//! Round-trip tests: for each dialect, converting a provider-native
//! conversation to the neutral history and back preserves message count,
//! roles (after documented aliasing), content order, text bytes, tool
//! linkage, and image payloads.  Cross-provider chains preserve text and
//! tool linkage end to end.

use serde_json::json;

use confab_history::convert::claude::{ClaudeBlock, ClaudeImageSource, ClaudeMessage};
use confab_history::convert::gemini::{
    GeminiContent, GeminiFunctionCall, GeminiFunctionResponse, GeminiPart,
};
use confab_history::convert::openai::{
    ChatContentPart, ChatFunctionCall, ChatImageUrl, ChatMessage, ChatToolCall,
};
use confab_history::{Content, History, Message, ProviderTag, Role};

fn args_map(v: serde_json::Value) -> serde_json::Map<String, serde_json::Value> {
    match v {
        serde_json::Value::Object(m) => m,
        _ => panic!("not an object"),
    }
}

// ─── OpenAI ──────────────────────────────────────────────────────────────────

fn openai_native_conversation() -> Vec<ChatMessage> {
    vec![
        ChatMessage {
            role: "system".into(),
            content: "be precise".into(),
            ..ChatMessage::default()
        },
        ChatMessage {
            role: "user".into(),
            multi_content: vec![
                ChatContentPart::Text {
                    text: "what is in this image?".into(),
                },
                ChatContentPart::ImageUrl {
                    image_url: ChatImageUrl {
                        url: "data:image/png;base64,AQID".into(),
                        detail: Some("high".into()),
                    },
                },
            ],
            ..ChatMessage::default()
        },
        ChatMessage {
            role: "assistant".into(),
            content: "let me check".into(),
            tool_calls: vec![ChatToolCall {
                id: "c1".into(),
                call_type: "function".into(),
                function: ChatFunctionCall {
                    name: "add".into(),
                    arguments: r#"{"a":2,"b":2}"#.into(),
                },
            }],
            ..ChatMessage::default()
        },
        ChatMessage {
            role: "tool".into(),
            content: r#"{"sum":4}"#.into(),
            tool_call_id: "c1".into(),
            ..ChatMessage::default()
        },
        ChatMessage {
            role: "assistant".into(),
            content: "the answer is 4".into(),
            ..ChatMessage::default()
        },
    ]
}

#[test]
fn openai_round_trip_preserves_wire_messages() {
    let native = openai_native_conversation();
    let h = History::from_openai(&native).unwrap();
    assert_eq!(h.provider, ProviderTag::OpenAi);
    let back = h.to_openai().unwrap();
    assert_eq!(back, native);
}

#[test]
fn openai_round_trip_preserves_unparseable_tool_arguments() {
    let native = vec![ChatMessage {
        role: "assistant".into(),
        tool_calls: vec![ChatToolCall {
            id: "c9".into(),
            call_type: "function".into(),
            function: ChatFunctionCall {
                name: "odd".into(),
                arguments: "{definitely not json".into(),
            },
        }],
        ..ChatMessage::default()
    }];
    let back = History::from_openai(&native).unwrap().to_openai().unwrap();
    assert_eq!(back, native);
}

// ─── Claude ──────────────────────────────────────────────────────────────────

fn claude_native_conversation() -> Vec<ClaudeMessage> {
    vec![
        ClaudeMessage {
            role: "user".into(),
            content: vec![
                ClaudeBlock::Text {
                    text: "describe this".into(),
                },
                ClaudeBlock::Image {
                    source: ClaudeImageSource {
                        source_type: "base64".into(),
                        media_type: "image/png".into(),
                        data: "AQID".into(),
                    },
                },
            ],
        },
        ClaudeMessage {
            role: "assistant".into(),
            content: vec![
                ClaudeBlock::Text {
                    text: "I need a tool".into(),
                },
                ClaudeBlock::ToolUse {
                    id: "c1".into(),
                    name: "add".into(),
                    input: json!({"a": 2, "b": 2}),
                },
            ],
        },
        ClaudeMessage {
            role: "user".into(),
            content: vec![ClaudeBlock::ToolResult {
                tool_use_id: "c1".into(),
                content: r#"{"sum":4}"#.into(),
                is_error: None,
            }],
        },
        ClaudeMessage {
            role: "assistant".into(),
            content: vec![ClaudeBlock::Text { text: "4".into() }],
        },
    ]
}

#[test]
fn claude_round_trip_preserves_wire_messages() {
    let native = claude_native_conversation();
    let h = History::from_claude(&native).unwrap();
    assert_eq!(h.provider, ProviderTag::Claude);
    let back = h.to_claude().unwrap();
    assert_eq!(back, native);
}

#[test]
fn claude_round_trip_preserves_error_results() {
    let native = vec![ClaudeMessage {
        role: "user".into(),
        content: vec![ClaudeBlock::ToolResult {
            tool_use_id: "c2".into(),
            content: "it broke".into(),
            is_error: Some(true),
        }],
    }];
    let back = History::from_claude(&native).unwrap().to_claude().unwrap();
    assert_eq!(back, native);
}

// Scenario S2: a neutral tool-call exchange converted to Claude and back is
// identical message for message.
#[test]
fn neutral_history_survives_claude_round_trip() {
    let mut h = History::new(ProviderTag::Neutral);
    h.append(Message::user("What's 2+2?"));
    h.append(Message::new(
        Role::Assistant,
        vec![Content::tool_call(
            "c1",
            "add",
            args_map(json!({"a": 2, "b": 2})),
        )],
    ));
    h.append(Message::tool_response(
        "c1",
        "",
        args_map(json!({"sum": 4})),
    ));
    h.append(Message::assistant("4"));

    let back = History::from_claude(&h.to_claude().unwrap()).unwrap();
    assert_eq!(back.messages, h.messages);
}

// ─── Gemini ──────────────────────────────────────────────────────────────────

fn gemini_native_conversation() -> Vec<GeminiContent> {
    vec![
        GeminiContent {
            role: "user".into(),
            parts: vec![GeminiPart::text("What's 2+2?")],
        },
        GeminiContent {
            role: "model".into(),
            parts: vec![GeminiPart {
                function_call: Some(GeminiFunctionCall {
                    id: Some("c1".into()),
                    name: "add".into(),
                    args: json!({"a": 2, "b": 2}),
                }),
                ..GeminiPart::default()
            }],
        },
        GeminiContent {
            role: "user".into(),
            parts: vec![GeminiPart {
                function_response: Some(GeminiFunctionResponse {
                    id: Some("c1".into()),
                    name: "add".into(),
                    response: json!({"sum": 4}),
                }),
                ..GeminiPart::default()
            }],
        },
        GeminiContent {
            role: "model".into(),
            parts: vec![GeminiPart::text("4")],
        },
    ]
}

#[test]
fn gemini_round_trip_preserves_wire_messages() {
    let native = gemini_native_conversation();
    let h = History::from_gemini(&native).unwrap();
    assert_eq!(h.provider, ProviderTag::Gemini);
    let back = h.to_gemini().unwrap();
    assert_eq!(back, native);
}

#[test]
fn gemini_round_trip_without_call_ids() {
    let native = vec![
        GeminiContent {
            role: "model".into(),
            parts: vec![GeminiPart {
                function_call: Some(GeminiFunctionCall {
                    id: None,
                    name: "probe".into(),
                    args: json!({}),
                }),
                ..GeminiPart::default()
            }],
        },
        GeminiContent {
            role: "user".into(),
            parts: vec![GeminiPart {
                function_response: Some(GeminiFunctionResponse {
                    id: None,
                    name: "probe".into(),
                    response: json!({"ok": true}),
                }),
                ..GeminiPart::default()
            }],
        },
    ];
    let back = History::from_gemini(&native).unwrap().to_gemini().unwrap();
    assert_eq!(back, native);
}

// ─── Cross-provider chains ───────────────────────────────────────────────────

// Scenario S3: OpenAI → Gemini → Claude, text and tool linkage intact.
#[test]
fn cross_provider_chain_preserves_text_and_tool_linkage() {
    let native = vec![
        ChatMessage {
            role: "user".into(),
            content: "What's 2+2?".into(),
            ..ChatMessage::default()
        },
        ChatMessage {
            role: "assistant".into(),
            tool_calls: vec![ChatToolCall {
                id: "c1".into(),
                call_type: "function".into(),
                function: ChatFunctionCall {
                    name: "add".into(),
                    arguments: r#"{"a":2,"b":2}"#.into(),
                },
            }],
            ..ChatMessage::default()
        },
        ChatMessage {
            role: "tool".into(),
            content: r#"{"sum":4}"#.into(),
            tool_call_id: "c1".into(),
            ..ChatMessage::default()
        },
        ChatMessage {
            role: "assistant".into(),
            content: "4".into(),
            ..ChatMessage::default()
        },
    ];

    let h1 = History::from_openai(&native).unwrap();
    let h2 = History::from_gemini(&h1.to_gemini().unwrap()).unwrap();
    let h3 = History::from_claude(&h2.to_claude().unwrap()).unwrap();

    assert_eq!(h3.len(), 4);
    assert_eq!(h3.messages[0].text(), "What's 2+2?");
    match &h3.messages[1].contents[0] {
        Content::ToolCall { id, name, arguments } => {
            assert_eq!(id, "c1");
            assert_eq!(name, "add");
            assert_eq!(arguments["a"], json!(2));
        }
        other => panic!("expected tool call, got {other:?}"),
    }
    match &h3.messages[2].contents[0] {
        Content::ToolResponse {
            tool_call_id,
            response,
            ..
        } => {
            assert_eq!(tool_call_id, "c1");
            assert_eq!(response["sum"], json!(4));
        }
        other => panic!("expected tool response, got {other:?}"),
    }
    assert_eq!(h3.messages[3].text(), "4");
}

// Documented asymmetry: URL-only images degrade to a text placeholder when
// the target is Claude.
#[test]
fn url_image_becomes_placeholder_on_claude_target() {
    let native = vec![ChatMessage {
        role: "user".into(),
        multi_content: vec![ChatContentPart::ImageUrl {
            image_url: ChatImageUrl {
                url: "https://example.com/cat.png".into(),
                detail: None,
            },
        }],
        ..ChatMessage::default()
    }];
    let h = History::from_openai(&native).unwrap();
    let wire = h.to_claude().unwrap();
    assert_eq!(
        wire[0].content[0],
        ClaudeBlock::Text {
            text: "[Image: https://example.com/cat.png]".into()
        }
    );
}

// Image bytes survive OpenAI → Gemini → OpenAI.
#[test]
fn image_bytes_survive_gemini_chain() {
    let native = vec![ChatMessage {
        role: "user".into(),
        multi_content: vec![ChatContentPart::ImageUrl {
            image_url: ChatImageUrl {
                url: "data:image/png;base64,AQID".into(),
                detail: None,
            },
        }],
        ..ChatMessage::default()
    }];
    let h1 = History::from_openai(&native).unwrap();
    let h2 = History::from_gemini(&h1.to_gemini().unwrap()).unwrap();
    match &h2.messages[0].contents[0] {
        Content::Image {
            media_type, data, ..
        } => {
            assert_eq!(media_type, "image/png");
            assert_eq!(data, &vec![1, 2, 3]);
        }
        other => panic!("expected image, got {other:?}"),
    }
    let back = h2.to_openai().unwrap();
    match &back[0].multi_content[0] {
        ChatContentPart::ImageUrl { image_url } => {
            assert_eq!(image_url.url, "data:image/png;base64,AQID");
        }
        other => panic!("expected image part, got {other:?}"),
    }
}
