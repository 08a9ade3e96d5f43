//! Per-user conversation state machine for the intake questionnaire
//!
//! The flow walks one user through three questions (name, course,
//! optionally a motivation essay), validates the course answer and
//! emits a [`Record`] exactly once when the conversation finalizes.
//! State lives in an in-process map keyed by user id; an abandoned
//! conversation simply leaves a stale entry behind.

use std::collections::HashMap;

use parking_lot::Mutex;

use crate::record::Record;
use crate::texts;

/// Pending question of an active conversation. A finished conversation
/// has no stage: its entry is removed at finalization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    AwaitingName,
    AwaitingCourse,
    AwaitingMotivation,
}

#[derive(Debug, Clone)]
struct Conversation {
    stage: Stage,
    name: Option<String>,
    course: Option<String>,
}

impl Conversation {
    fn new() -> Self {
        Self {
            stage: Stage::AwaitingName,
            name: None,
            course: None,
        }
    }
}

/// Reply-keyboard effect attached to an outbound message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Keyboard {
    /// Show the six-button course picker ("1".."6+").
    Courses,
    /// Remove any previously shown picker.
    Remove,
    /// Leave the keyboard as it is.
    Inherit,
}

/// One message to send back to the user, transport-agnostic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outbound {
    pub text: String,
    pub keyboard: Keyboard,
    /// Whether the text carries HTML markup (the closing templates do).
    pub html: bool,
}

impl Outbound {
    fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            keyboard: Keyboard::Inherit,
            html: false,
        }
    }

    fn with_keyboard(text: impl Into<String>, keyboard: Keyboard) -> Self {
        Self {
            text: text.into(),
            keyboard,
            html: false,
        }
    }

    fn html(text: impl Into<String>, keyboard: Keyboard) -> Self {
        Self {
            text: text.into(),
            keyboard,
            html: true,
        }
    }
}

/// Result of feeding one inbound message into the flow: the replies to
/// send, in order, plus at most one finalized record.
#[derive(Debug, Default)]
pub struct Turn {
    pub replies: Vec<Outbound>,
    pub record: Option<Record>,
}

impl Turn {
    fn ignore() -> Self {
        Self::default()
    }

    fn reply(outbound: Outbound) -> Self {
        Self {
            replies: vec![outbound],
            record: None,
        }
    }

    /// True when the message produced no reply and no record.
    pub fn is_ignored(&self) -> bool {
        self.replies.is_empty() && self.record.is_none()
    }
}

/// Classified course answer. The "6+" sentinel is matched verbatim
/// before any numeric parsing is attempted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CourseAnswer {
    /// "6+" or an integer above four: skips the motivation step.
    Senior,
    /// An integer in 1..=4: the motivation question follows.
    Junior(u8),
    /// Parses as an integer but is zero or negative.
    OutOfRange,
    /// Not an integer and not the sentinel.
    Invalid,
}

impl CourseAnswer {
    pub fn parse(text: &str) -> Self {
        let text = text.trim();
        if text == texts::SENIOR_SENTINEL {
            return Self::Senior;
        }
        match text.parse::<i64>() {
            Ok(n) if n > 4 => Self::Senior,
            Ok(n) if (1..=4).contains(&n) => Self::Junior(n as u8),
            Ok(_) => Self::OutOfRange,
            Err(_) => Self::Invalid,
        }
    }
}

/// The conversation state machine. Owns all per-user state; safe to
/// share behind an `Arc` across handler tasks.
pub struct IntakeFlow {
    invite_link: String,
    sessions: Mutex<HashMap<i64, Conversation>>,
}

impl IntakeFlow {
    pub fn new(invite_link: impl Into<String>) -> Self {
        Self {
            invite_link: invite_link.into(),
            sessions: Mutex::new(HashMap::new()),
        }
    }

    /// Handles the start command: (re)creates the conversation and asks
    /// for the user's name.
    pub fn start(&self, user_id: i64) -> Turn {
        self.sessions.lock().insert(user_id, Conversation::new());
        Turn::reply(Outbound::plain(texts::WELCOME))
    }

    /// Drops the user's conversation, if any. Returns whether one was
    /// active.
    pub fn cancel(&self, user_id: i64) -> bool {
        self.sessions.lock().remove(&user_id).is_some()
    }

    pub fn is_active(&self, user_id: i64) -> bool {
        self.sessions.lock().contains_key(&user_id)
    }

    /// Current stage of the user's conversation, if one is active.
    pub fn stage(&self, user_id: i64) -> Option<Stage> {
        self.sessions.lock().get(&user_id).map(|c| c.stage)
    }

    /// Feeds one text message into the flow. Messages from users with
    /// no active conversation are ignored without a reply.
    pub fn handle_text(&self, user_id: i64, username: Option<&str>, text: &str) -> Turn {
        let mut sessions = self.sessions.lock();
        // The entry is taken out and only reinserted while the
        // conversation stays active, so finalization can emit at most
        // one record per conversation.
        let Some(mut conv) = sessions.remove(&user_id) else {
            return Turn::ignore();
        };

        match conv.stage {
            Stage::AwaitingName => {
                conv.name = Some(text.to_owned());
                conv.stage = Stage::AwaitingCourse;
                sessions.insert(user_id, conv);
                Turn::reply(Outbound::with_keyboard(
                    texts::COURSE_PROMPT,
                    Keyboard::Courses,
                ))
            }
            Stage::AwaitingCourse => match CourseAnswer::parse(text) {
                CourseAnswer::Senior => {
                    conv.course = Some(text.trim().to_owned());
                    let closing = Outbound::html(
                        texts::final_senior(&self.invite_link),
                        Keyboard::Remove,
                    );
                    self.finalize(user_id, username, conv, None, closing)
                }
                CourseAnswer::Junior(_) => {
                    conv.course = Some(text.trim().to_owned());
                    conv.stage = Stage::AwaitingMotivation;
                    sessions.insert(user_id, conv);
                    Turn::reply(Outbound::with_keyboard(
                        texts::MOTIVATION_PROMPT,
                        Keyboard::Remove,
                    ))
                }
                CourseAnswer::OutOfRange => {
                    sessions.insert(user_id, conv);
                    Turn::reply(Outbound::with_keyboard(texts::REPEAT, Keyboard::Remove))
                }
                CourseAnswer::Invalid => {
                    sessions.insert(user_id, conv);
                    Turn::reply(Outbound::with_keyboard(
                        texts::REPEAT_INVALID_FORMAT,
                        Keyboard::Remove,
                    ))
                }
            },
            Stage::AwaitingMotivation => {
                let closing = Outbound::html(
                    texts::final_junior(&self.invite_link),
                    Keyboard::Inherit,
                );
                self.finalize(user_id, username, conv, Some(text.to_owned()), closing)
            }
        }
    }

    fn finalize(
        &self,
        user_id: i64,
        username: Option<&str>,
        conv: Conversation,
        motivation: Option<String>,
        closing: Outbound,
    ) -> Turn {
        let record = Record {
            user_id,
            username: username.map(str::to_owned),
            name: conv.name.unwrap_or_default(),
            course: conv.course.unwrap_or_default(),
            motivation,
        };
        Turn {
            replies: vec![closing],
            record: Some(record),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const UID: i64 = 42;

    fn flow() -> IntakeFlow {
        IntakeFlow::new("https://t.me/+orgkom")
    }

    fn assert_single_reply(turn: &Turn, text: &str) {
        assert_eq!(turn.replies.len(), 1);
        assert_eq!(turn.replies[0].text, text);
        assert!(turn.record.is_none());
    }

    #[test]
    fn test_course_answer_classification() {
        assert_eq!(CourseAnswer::parse("6+"), CourseAnswer::Senior);
        assert_eq!(CourseAnswer::parse(" 6+ "), CourseAnswer::Senior);
        assert_eq!(CourseAnswer::parse("5"), CourseAnswer::Senior);
        assert_eq!(CourseAnswer::parse("100"), CourseAnswer::Senior);
        assert_eq!(CourseAnswer::parse("1"), CourseAnswer::Junior(1));
        assert_eq!(CourseAnswer::parse("4"), CourseAnswer::Junior(4));
        assert_eq!(CourseAnswer::parse("0"), CourseAnswer::OutOfRange);
        assert_eq!(CourseAnswer::parse("-3"), CourseAnswer::OutOfRange);
        assert_eq!(CourseAnswer::parse("abc"), CourseAnswer::Invalid);
        assert_eq!(CourseAnswer::parse("4.5"), CourseAnswer::Invalid);
        assert_eq!(CourseAnswer::parse(""), CourseAnswer::Invalid);
        assert_eq!(CourseAnswer::parse("6 +"), CourseAnswer::Invalid);
    }

    #[test]
    fn test_start_asks_for_name() {
        let flow = flow();
        let turn = flow.start(UID);
        assert_single_reply(&turn, texts::WELCOME);
        assert_eq!(flow.stage(UID), Some(Stage::AwaitingName));
    }

    #[test]
    fn test_full_flow_with_motivation() {
        let flow = flow();
        flow.start(UID);

        let turn = flow.handle_text(UID, Some("ann_un"), "Ann");
        assert_single_reply(&turn, texts::COURSE_PROMPT);
        assert_eq!(turn.replies[0].keyboard, Keyboard::Courses);
        assert_eq!(flow.stage(UID), Some(Stage::AwaitingCourse));

        let turn = flow.handle_text(UID, Some("ann_un"), "3");
        assert_single_reply(&turn, texts::MOTIVATION_PROMPT);
        assert_eq!(turn.replies[0].keyboard, Keyboard::Remove);
        assert_eq!(flow.stage(UID), Some(Stage::AwaitingMotivation));

        let turn = flow.handle_text(UID, Some("ann_un"), "because");
        assert_eq!(turn.replies.len(), 1);
        assert!(turn.replies[0].html);
        assert_eq!(
            turn.replies[0].text,
            texts::final_junior("https://t.me/+orgkom")
        );
        assert_eq!(
            turn.record,
            Some(Record {
                user_id: UID,
                username: Some("ann_un".into()),
                name: "Ann".into(),
                course: "3".into(),
                motivation: Some("because".into()),
            })
        );
        assert!(!flow.is_active(UID));
    }

    #[test]
    fn test_numeric_early_exit_skips_motivation() {
        let flow = flow();
        flow.start(UID);
        flow.handle_text(UID, Some("bo_un"), "Bo");

        let turn = flow.handle_text(UID, Some("bo_un"), "5");
        assert_eq!(turn.replies.len(), 1);
        assert!(turn.replies[0].html);
        assert_eq!(
            turn.replies[0].text,
            texts::final_senior("https://t.me/+orgkom")
        );
        assert_eq!(turn.replies[0].keyboard, Keyboard::Remove);
        assert_eq!(
            turn.record,
            Some(Record {
                user_id: UID,
                username: Some("bo_un".into()),
                name: "Bo".into(),
                course: "5".into(),
                motivation: None,
            })
        );
        assert!(!flow.is_active(UID));
    }

    #[test]
    fn test_sentinel_early_exit() {
        let flow = flow();
        flow.start(UID);
        flow.handle_text(UID, Some("cy_un"), "Cy");

        let turn = flow.handle_text(UID, Some("cy_un"), "6+");
        let record = turn.record.expect("sentinel finalizes");
        assert_eq!(record.course, "6+");
        assert_eq!(record.motivation, None);
        assert!(!flow.is_active(UID));
    }

    #[test]
    fn test_invalid_course_reprompts_in_place() {
        let flow = flow();
        flow.start(UID);
        flow.handle_text(UID, Some("di_un"), "Di");

        let turn = flow.handle_text(UID, Some("di_un"), "abc");
        assert_single_reply(&turn, texts::REPEAT_INVALID_FORMAT);
        assert_eq!(flow.stage(UID), Some(Stage::AwaitingCourse));

        // Stored answers are untouched: the retry still works.
        let turn = flow.handle_text(UID, Some("di_un"), "2");
        assert_single_reply(&turn, texts::MOTIVATION_PROMPT);
        assert_eq!(flow.stage(UID), Some(Stage::AwaitingMotivation));

        let record = flow
            .handle_text(UID, Some("di_un"), "why not")
            .record
            .expect("finalizes after retry");
        assert_eq!(record.name, "Di");
        assert_eq!(record.course, "2");
    }

    #[test]
    fn test_non_positive_course_reprompts() {
        let flow = flow();
        flow.start(UID);
        flow.handle_text(UID, None, "Ed");

        for input in ["0", "-1"] {
            let turn = flow.handle_text(UID, None, input);
            assert_single_reply(&turn, texts::REPEAT);
            assert_eq!(flow.stage(UID), Some(Stage::AwaitingCourse));
        }
    }

    #[test]
    fn test_message_without_conversation_is_ignored() {
        let flow = flow();
        let turn = flow.handle_text(UID, Some("ghost"), "hello");
        assert!(turn.is_ignored());
        assert!(!flow.is_active(UID));
    }

    #[test]
    fn test_message_after_completion_is_ignored() {
        let flow = flow();
        flow.start(UID);
        flow.handle_text(UID, None, "Bo");
        let turn = flow.handle_text(UID, None, "6+");
        assert!(turn.record.is_some());

        // The conversation is gone; a stray follow-up emits nothing.
        let turn = flow.handle_text(UID, None, "one more thing");
        assert!(turn.is_ignored());
    }

    #[test]
    fn test_restart_resets_collected_answers() {
        let flow = flow();
        flow.start(UID);
        flow.handle_text(UID, None, "Old Name");
        flow.start(UID);
        assert_eq!(flow.stage(UID), Some(Stage::AwaitingName));

        flow.handle_text(UID, None, "New Name");
        let record = flow.handle_text(UID, None, "6+").record.unwrap();
        assert_eq!(record.name, "New Name");
    }

    #[test]
    fn test_cancel_drops_conversation() {
        let flow = flow();
        assert!(!flow.cancel(UID));
        flow.start(UID);
        assert!(flow.cancel(UID));
        assert!(flow.handle_text(UID, None, "Ann").is_ignored());
    }

    #[test]
    fn test_users_do_not_interfere() {
        let flow = flow();
        flow.start(1);
        flow.start(2);
        flow.handle_text(1, Some("a"), "Ann");
        flow.handle_text(2, Some("b"), "Bo");
        flow.handle_text(1, Some("a"), "2");

        let record = flow.handle_text(2, Some("b"), "5").record.unwrap();
        assert_eq!(record.name, "Bo");
        assert_eq!(flow.stage(1), Some(Stage::AwaitingMotivation));
    }
}
