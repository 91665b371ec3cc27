//! Shared test fixtures: investment forms, a canned Lyon T2 scenario, and a
//! stub `CompletionTransport` that records what it was sent.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use immo_calc::commentary::ChatRequest;
use immo_calc::{
    Calculator, CommentaryRequester, CompletionTransport, DerivedMetrics, HttpReply,
    InvestmentForm, InvestmentRequest,
};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

// ---------------------------------------------------------------------------
// Forms and requests
// ---------------------------------------------------------------------------

pub fn form(city: &str, budget: Decimal, unit: &str, age: &str, renovation: &str) -> InvestmentForm {
    InvestmentForm {
        city: city.to_string(),
        total_budget: budget,
        renovation_budget: None,
        property_age: age.to_string(),
        unit_type: unit.to_string(),
        renovation_level: renovation.to_string(),
        goal: "patrimoine".to_string(),
    }
}

/// Lyon, T2, existing, no renovation, 300 000 budget.
pub fn lyon_t2_form() -> InvestmentForm {
    form("Lyon", dec!(300000), "T2", "existing", "none")
}

pub fn evaluate(form: &InvestmentForm) -> (InvestmentRequest, DerivedMetrics) {
    Calculator::builder().build().evaluate(form).unwrap()
}

pub fn lyon_t2() -> (InvestmentRequest, DerivedMetrics) {
    evaluate(&lyon_t2_form())
}

// ---------------------------------------------------------------------------
// Stub transport
// ---------------------------------------------------------------------------

pub type Reply = Result<HttpReply, String>;

/// Returns queued replies in order, repeating the last one once the queue
/// is drained. Clones share call count and recorded requests.
#[derive(Clone)]
pub struct StubTransport {
    replies: Arc<Mutex<VecDeque<Reply>>>,
    last_reply: Arc<Mutex<Reply>>,
    calls: Arc<AtomicUsize>,
    sent: Arc<Mutex<Vec<ChatRequest>>>,
}

impl StubTransport {
    pub fn new(reply: Reply) -> Self {
        Self::sequence(vec![reply])
    }

    pub fn sequence(replies: Vec<Reply>) -> Self {
        let last = replies
            .last()
            .cloned()
            .unwrap_or_else(|| Err("no reply configured".to_string()));
        Self {
            replies: Arc::new(Mutex::new(replies.into())),
            last_reply: Arc::new(Mutex::new(last)),
            calls: Arc::new(AtomicUsize::new(0)),
            sent: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn ok(content: &str) -> Self {
        Self::new(Ok(success_reply(content)))
    }

    pub fn status(status: u16, body: &str) -> Self {
        Self::new(Ok(HttpReply {
            status,
            body: body.to_string(),
        }))
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn sent(&self) -> Vec<ChatRequest> {
        self.sent.lock().unwrap().clone()
    }
}

impl CompletionTransport for StubTransport {
    fn post(&self, request: &ChatRequest) -> Result<HttpReply, String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.sent.lock().unwrap().push(request.clone());
        match self.replies.lock().unwrap().pop_front() {
            Some(reply) => reply,
            None => self.last_reply.lock().unwrap().clone(),
        }
    }
}

pub fn success_body(content: &str) -> String {
    serde_json::json!({
        "id": "cmpl-test",
        "model": "sonar-deep-research",
        "choices": [
            { "index": 0, "message": { "role": "assistant", "content": content } }
        ],
        "usage": { "prompt_tokens": 120, "completion_tokens": 80, "total_tokens": 200 }
    })
    .to_string()
}

pub fn success_reply(content: &str) -> HttpReply {
    HttpReply {
        status: 200,
        body: success_body(content),
    }
}

/// Requester with a test key wired to `stub`.
pub fn requester_with(stub: &StubTransport) -> CommentaryRequester {
    CommentaryRequester::builder()
        .api_key("test-key")
        .transport(stub.clone())
        .build()
        .unwrap()
}
