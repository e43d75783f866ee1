use lazy_static::lazy_static;
use std::sync::Arc;
use tokio::sync::watch;

/// The token of the signed in user, shared with everything that needs to react to it.
#[derive(Clone)]
pub struct UserToken {
    sender: Arc<watch::Sender<Option<String>>>
}

impl UserToken {
    pub fn new() -> Self {
        let (sender, _) = watch::channel(None);
        Self {
            sender: Arc::new(sender)
        }
    }

    /// Replace the token. `None` signs the user out.
    pub fn set(&self, token: Option<String>) {
        self.sender.send_replace(token);
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<String>> {
        self.sender.subscribe()
    }

    /// The token right now. Subscribes, reads and unsubscribes again.
    pub fn current(&self) -> Option<String> {
        let receiver = self.subscribe();
        let token = receiver.borrow().clone();
        token
    }
}

impl Default for UserToken {
    fn default() -> Self {
        Self::new()
    }
}

lazy_static! {
    static ref USER_TOKEN: UserToken = UserToken::new();
}

/// The process-wide token store.
pub fn user_token() -> UserToken {
    USER_TOKEN.clone()
}
