use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// What the bot is waiting for from an admin, keyed by user id. Set when an
/// admin presses a panel button, consumed by the next plain-text message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PendingAction {
    SetChannel,
    SetContact,
    SetDaily,
    SetRefBonus,
    SetCost,
    SetLoseWeight,
    SetGift(u8),
    CreditFree,
    CreditPaid,
}

#[derive(Clone, Default)]
pub struct Sessions {
    inner: Arc<Mutex<HashMap<i64, PendingAction>>>,
}

impl Sessions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, user_id: i64, action: PendingAction) {
        self.inner.lock().unwrap().insert(user_id, action);
    }

    pub fn get(&self, user_id: i64) -> Option<PendingAction> {
        self.inner.lock().unwrap().get(&user_id).copied()
    }

    pub fn clear(&self, user_id: i64) {
        self.inner.lock().unwrap().remove(&user_id);
    }
}
