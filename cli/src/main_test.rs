use std::sync::Mutex;

use carechat::{ChatReply, ChatRequest, ChatTransport, ExchangeError, Message};

use super::*;

struct ScriptedTransport {
    results: Mutex<Vec<Result<ChatReply, ExchangeError>>>,
}

#[async_trait::async_trait]
impl ChatTransport for ScriptedTransport {
    async fn exchange(&self, _request: &ChatRequest) -> Result<ChatReply, ExchangeError> {
        self.results.lock().unwrap().remove(0)
    }
}

fn session_with(results: Vec<Result<ChatReply, ExchangeError>>) -> ChatSession {
    ChatSession::new(Arc::new(ScriptedTransport { results: Mutex::new(results) }))
}

#[test]
fn exit_commands_are_case_insensitive_and_trimmed() {
    for line in ["exit", "quit", "EXIT", "  Quit \n"] {
        assert!(is_exit_command(line), "{line:?} should exit");
    }
    for line in ["", "exit now", "q", "bye"] {
        assert!(!is_exit_command(line), "{line:?} should not exit");
    }
}

#[test]
fn cli_defaults_to_chat_with_local_backend() {
    let cli = Cli::try_parse_from(["carechat"]).unwrap();
    assert!(cli.command.is_none());
    assert_eq!(cli.request_timeout_secs, DEFAULT_REQUEST_TIMEOUT_SECS);
}

#[test]
fn cli_parses_ask_words() {
    let cli = Cli::try_parse_from(["carechat", "--base-url", "http://10.0.0.2:8000", "ask", "Is", "Dr", "Smith", "free?"])
        .unwrap();
    assert_eq!(cli.base_url, "http://10.0.0.2:8000");
    match cli.command {
        Some(Command::Ask { message }) => assert_eq!(message.join(" "), "Is Dr Smith free?"),
        other => panic!("expected ask, got {other:?}"),
    }
}

#[tokio::test]
async fn run_turn_renders_typing_then_reply() {
    let session = session_with(vec![Ok(ChatReply { response: "Sure, what day works?".into(), thread_id: Some("abc123".into()) })]);
    let mut rx = session.subscribe();
    let mut transcript = Transcript::default();
    let mut out: Vec<u8> = Vec::new();
    transcript.render(&rx.borrow_and_update(), &mut out).unwrap();
    out.clear();

    session.update_input("Book me a cardiologist visit");
    let outcome = run_turn(&session, &mut rx, &mut transcript, &mut out).await.unwrap();

    assert_eq!(outcome, SubmitOutcome::Replied);
    let text = String::from_utf8(out).unwrap();
    assert!(text.ends_with("Assistant: Sure, what day works?\n"));
    assert_eq!(session.thread_id().as_deref(), Some("abc123"));
}

#[tokio::test]
async fn run_turn_renders_fallback_on_failure() {
    let session = session_with(vec![Err(ExchangeError::Request("refused".into()))]);
    let mut rx = session.subscribe();
    let mut transcript = Transcript::default();
    let mut out: Vec<u8> = Vec::new();
    rx.borrow_and_update();
    transcript.render(&session.snapshot(), &mut io::sink()).unwrap();

    session.update_input("hello");
    let outcome = run_turn(&session, &mut rx, &mut transcript, &mut out).await.unwrap();

    assert_eq!(outcome, SubmitOutcome::Failed);
    let text = String::from_utf8(out).unwrap();
    assert!(text.contains(&Message::fallback().content));
}

#[tokio::test]
async fn ask_with_blank_message_reports_empty() {
    let session = session_with(vec![]);
    let err = run_ask(session.clone(), "   ").await.unwrap_err();
    assert!(matches!(err, CliError::EmptyMessage));
    assert_eq!(session.messages().len(), 1);
}
