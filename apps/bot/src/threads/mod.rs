//! Thread reconstruction — rebuilds an ordered conversational turn sequence
//! from a raw comment-thread snapshot and decides whether the thread needs
//! a reply.
//!
//! Readiness is derived purely from turn parity at poll time: a thread is
//! ready iff its reconstructed sequence is non-empty, has an odd number of
//! turns, and ends on a human turn. A thread whose last turn is the bot's
//! is already answered and is never touched again until the author replies.
//!
//! Reconstruction is pure and deterministic over an immutable snapshot —
//! running it twice on the same snapshot yields identical state.

use serde::{Deserialize, Serialize};

/// One comment plus its nested replies, as read from the wall snapshot.
/// Immutable once fetched; reconstruction never mutates it.
#[derive(Debug, Clone, PartialEq)]
pub struct CommentItem {
    pub id: i64,
    /// Absent on comments from deleted or restricted accounts; such items
    /// are skipped, never fatal.
    pub author_id: Option<i64>,
    /// For the bot's own replies this is the recovered caption text, not
    /// the literal posted body (the posted artifact is an image).
    pub text: String,
    /// The user this reply is explicitly directed at, when any.
    pub reply_to_user_id: Option<i64>,
    pub replies: Vec<CommentItem>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    Human,
    Agent,
}

/// One reconstructed conversational exchange.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Turn {
    pub role: Role,
    pub content: String,
}

impl Turn {
    pub fn human(content: impl Into<String>) -> Self {
        Turn {
            role: Role::Human,
            content: content.into(),
        }
    }

    pub fn agent(content: impl Into<String>) -> Self {
        Turn {
            role: Role::Agent,
            content: content.into(),
        }
    }
}

/// A thread's reconstructed state: ordered turns plus the readiness verdict.
#[derive(Debug, Clone, PartialEq)]
pub struct ThreadState {
    pub root_id: i64,
    pub turns: Vec<Turn>,
    pub ready: bool,
}

/// Rebuilds turn sequences for the threads under one post.
pub struct ThreadReconstructor {
    /// Account id the bot posts under (the community owner id).
    bot_id: i64,
}

impl ThreadReconstructor {
    pub fn new(bot_id: i64) -> Self {
        ThreadReconstructor { bot_id }
    }

    /// Walks the nested replies in arrival order and assembles the turn
    /// sequence:
    /// - a reply authored by the bot account → `Agent` turn;
    /// - a reply by the root author, directed at the bot, with substantive
    ///   text → `Human` turn;
    /// - everything else (third-party chatter, emoji-only, empty, missing
    ///   author id) is skipped and neither breaks nor extends the sequence.
    pub fn reconstruct(&self, root: &CommentItem) -> ThreadState {
        let mut turns: Vec<Turn> = Vec::new();

        if is_substantive(&root.text) {
            turns.push(Turn::human(root.text.clone()));
        }

        for reply in &root.replies {
            let Some(author) = reply.author_id else {
                continue;
            };
            if author == self.bot_id {
                push_turn(&mut turns, Role::Agent, &reply.text);
            } else if Some(author) == root.author_id
                && reply.reply_to_user_id == Some(self.bot_id)
                && is_substantive(&reply.text)
            {
                push_turn(&mut turns, Role::Human, &reply.text);
            }
        }

        // The explicit last-turn check guards the degenerate case where the
        // root turn was filtered and the sequence starts with the bot.
        let ready = turns.len() % 2 == 1
            && turns.last().map(|t| t.role == Role::Human).unwrap_or(false);

        ThreadState {
            root_id: root.id,
            turns,
            ready,
        }
    }
}

/// Appends a turn, coalescing consecutive same-role turns into one (contents
/// joined with a newline). Keeps strict Human/Agent alternation, so a thread
/// where the author replied twice before the bot answered stays answerable
/// instead of being parity-locked.
fn push_turn(turns: &mut Vec<Turn>, role: Role, content: &str) {
    if let Some(last) = turns.last_mut() {
        if last.role == role {
            last.content.push('\n');
            last.content.push_str(content);
            return;
        }
    }
    turns.push(Turn {
        role,
        content: content.to_string(),
    });
}

/// True when the text carries at least one non-whitespace, non-emoji
/// character. Emoji-only and empty comments are filtered out of turn
/// assembly entirely — they are not counted toward parity.
pub fn is_substantive(text: &str) -> bool {
    text.chars().any(|c| !c.is_whitespace() && !is_emoji(c))
}

/// Covers the emoji blocks VK clients actually emit: pictographs and
/// emoticons, misc symbols and dingbats, symbols-extended, plus the
/// selectors and joiners that accompany them.
fn is_emoji(c: char) -> bool {
    matches!(
        u32::from(c),
        0x1F000..=0x1FAFF       // emoticons, pictographs, supplemental symbols
            | 0x2600..=0x27BF   // misc symbols, dingbats
            | 0x2B00..=0x2BFF   // misc symbols and arrows (stars, shapes)
            | 0x2300..=0x23FF   // misc technical (watch, hourglass, media keys)
            | 0xFE00..=0xFE0F   // variation selectors
            | 0x200D            // zero-width joiner
            | 0x20E3            // combining enclosing keycap
    )
}
