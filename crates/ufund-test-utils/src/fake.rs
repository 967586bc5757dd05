//! In-memory backend
//!
//! Behaves like the uFund services closely enough for flow tests: ids are
//! assigned on create, name conflicts return `None`, unknown records on
//! update are 404s. Every call is recorded, and calls can be made to fail
//! with a 503.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use ufund_client::{ChatApi, ClientError, CupboardApi, SessionApi, UserApi};
use ufund_model::{
    BasketNeed, ChatPersonality, Credentials, Need, NeedId, Role, Session, User, UserId,
};

#[derive(Debug, Default)]
struct State {
    needs: Vec<Need>,
    users: Vec<User>,
    sessions: HashMap<String, Session>,
    chats: HashMap<UserId, ChatPersonality>,
    personalities: Vec<ChatPersonality>,
    calls: Vec<&'static str>,
    failing: HashSet<&'static str>,
    fail_next: usize,
}

#[derive(Debug, Default)]
pub struct FakeBackend {
    state: Mutex<State>,
}

fn status(operation: &'static str, status: u16) -> ClientError {
    ClientError::Status { operation, status }
}

fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

impl FakeBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_needs(self, needs: Vec<Need>) -> Self {
        self.state.lock().needs = needs;
        self
    }

    pub fn with_user(self, user: User) -> Self {
        self.state.lock().users.push(user);
        self
    }

    pub fn with_personalities(self, personalities: Vec<ChatPersonality>) -> Self {
        self.state.lock().personalities = personalities;
        self
    }

    /// Fail every call to `operation` with a 503
    pub fn fail_operation(&self, operation: &'static str) {
        self.state.lock().failing.insert(operation);
    }

    pub fn recover_operation(&self, operation: &'static str) {
        self.state.lock().failing.remove(operation);
    }

    /// Fail the next `count` calls, whatever they are
    pub fn fail_next(&self, count: usize) {
        self.state.lock().fail_next = count;
    }

    pub fn calls(&self) -> Vec<&'static str> {
        self.state.lock().calls.clone()
    }

    pub fn call_count(&self, operation: &str) -> usize {
        self.state.lock().calls.iter().filter(|c| **c == operation).count()
    }

    pub fn need(&self, id: NeedId) -> Option<Need> {
        self.state.lock().needs.iter().find(|n| n.id == id).cloned()
    }

    pub fn needs(&self) -> Vec<Need> {
        self.state.lock().needs.clone()
    }

    pub fn set_need(&self, need: Need) {
        let mut state = self.state.lock();
        match state.needs.iter_mut().find(|n| n.id == need.id) {
            Some(slot) => *slot = need,
            None => state.needs.push(need),
        }
    }

    pub fn remove_need(&self, id: NeedId) {
        self.state.lock().needs.retain(|n| n.id != id);
    }

    pub fn user_named(&self, name: &str) -> Option<User> {
        self.state.lock().users.iter().find(|u| u.user_name == name).cloned()
    }

    pub fn has_session(&self, name: &str) -> bool {
        self.state.lock().sessions.contains_key(name)
    }

    pub fn insert_session(&self, session: Session) {
        self.state.lock().sessions.insert(session.user_name.clone(), session);
    }

    fn enter(&self, operation: &'static str) -> Result<parking_lot::MutexGuard<'_, State>, ClientError> {
        let mut state = self.state.lock();
        state.calls.push(operation);
        if state.fail_next > 0 {
            state.fail_next -= 1;
            return Err(status(operation, 503));
        }
        if state.failing.contains(operation) {
            return Err(status(operation, 503));
        }
        Ok(state)
    }
}

impl State {
    fn user_mut(&mut self, id: UserId, operation: &'static str) -> Result<&mut User, ClientError> {
        self.users
            .iter_mut()
            .find(|u| u.id == id)
            .ok_or_else(|| status(operation, 404))
    }

    fn open_session(&mut self, user_name: &str, id: UserId) -> Session {
        let session = Session {
            id: id.0,
            user_name: user_name.to_string(),
            timer: now_ms(),
        };
        self.sessions.insert(user_name.to_string(), session.clone());
        session
    }
}

#[async_trait]
impl CupboardApi for FakeBackend {
    async fn list_needs(&self) -> Result<Vec<Need>, ClientError> {
        Ok(self.enter("list_needs")?.needs.clone())
    }

    async fn get_need(&self, id: NeedId) -> Result<Option<Need>, ClientError> {
        Ok(self.enter("get_need")?.needs.iter().find(|n| n.id == id).cloned())
    }

    async fn search_needs(&self, name: &str) -> Result<Vec<Need>, ClientError> {
        let state = self.enter("search_needs")?;
        Ok(state.needs.iter().filter(|n| n.name_contains(name)).cloned().collect())
    }

    async fn create_need(&self, need: &Need) -> Result<Option<Need>, ClientError> {
        let mut state = self.enter("create_need")?;
        if state.needs.iter().any(|n| n.name == need.name) {
            return Ok(None);
        }
        let next = state.needs.iter().map(|n| n.id.0).max().unwrap_or(0) + 1;
        let mut created = need.clone();
        created.id = NeedId(next);
        state.needs.push(created.clone());
        Ok(Some(created))
    }

    async fn update_need(&self, need: &Need) -> Result<Need, ClientError> {
        let mut state = self.enter("update_need")?;
        let slot = state
            .needs
            .iter_mut()
            .find(|n| n.id == need.id)
            .ok_or_else(|| status("update_need", 404))?;
        *slot = need.clone();
        Ok(need.clone())
    }

    async fn delete_need(&self, id: NeedId) -> Result<(), ClientError> {
        let mut state = self.enter("delete_need")?;
        let before = state.needs.len();
        state.needs.retain(|n| n.id != id);
        if state.needs.len() == before {
            return Err(status("delete_need", 404));
        }
        Ok(())
    }
}

#[async_trait]
impl UserApi for FakeBackend {
    async fn create_user(&self, user: &User) -> Result<Option<User>, ClientError> {
        let mut state = self.enter("create_user")?;
        if state.users.iter().any(|u| u.user_name == user.user_name) {
            return Ok(None);
        }
        let next = state.users.iter().map(|u| u.id.0).max().unwrap_or(0) + 1;
        let mut created = user.clone();
        created.id = UserId(next);
        created.role = Some(Role::for_user_name(&created.user_name));
        state.users.push(created.clone());
        Ok(Some(created))
    }

    async fn get_user_by_name(&self, user_name: &str) -> Result<Option<User>, ClientError> {
        let state = self.enter("get_user_by_name")?;
        Ok(state.users.iter().find(|u| u.user_name == user_name).cloned())
    }

    async fn get_user(&self, id: UserId) -> Result<Option<User>, ClientError> {
        Ok(self.enter("get_user")?.users.iter().find(|u| u.id == id).cloned())
    }

    async fn list_users(&self) -> Result<Vec<User>, ClientError> {
        Ok(self.enter("list_users")?.users.clone())
    }

    async fn update_user(&self, user: &User) -> Result<User, ClientError> {
        let mut state = self.enter("update_user")?;
        let slot = state.user_mut(user.id, "update_user")?;
        *slot = user.clone();
        Ok(user.clone())
    }

    async fn get_basket(&self, id: UserId) -> Result<Vec<BasketNeed>, ClientError> {
        let mut state = self.enter("get_basket")?;
        Ok(state.user_mut(id, "get_basket")?.basket.clone())
    }

    async fn add_to_basket(&self, id: UserId, need: &Need) -> Result<User, ClientError> {
        let mut state = self.enter("add_to_basket")?;
        let user = state.user_mut(id, "add_to_basket")?;
        user.basket.push(BasketNeed::new(need.clone(), 1));
        Ok(user.clone())
    }

    async fn remove_from_basket(&self, id: UserId, need: &Need) -> Result<User, ClientError> {
        let mut state = self.enter("remove_from_basket")?;
        let user = state.user_mut(id, "remove_from_basket")?;
        if let Some(index) = user.basket.iter().position(|e| e.need.id == need.id) {
            user.basket.remove(index);
        }
        Ok(user.clone())
    }

    async fn set_basket_count(
        &self,
        id: UserId,
        need: &Need,
        count: i32,
    ) -> Result<User, ClientError> {
        let mut state = self.enter("set_basket_count")?;
        let user = state.user_mut(id, "set_basket_count")?;
        let entry = user
            .basket
            .iter_mut()
            .rev()
            .find(|e| e.need.id == need.id)
            .ok_or_else(|| status("set_basket_count", 404))?;
        entry.count = count;
        Ok(user.clone())
    }
}

#[async_trait]
impl SessionApi for FakeBackend {
    async fn login(&self, credentials: &Credentials) -> Result<Option<Session>, ClientError> {
        let mut state = self.enter("login")?;
        let Some(user) = state
            .users
            .iter()
            .find(|u| u.user_name == credentials.username && u.password == credentials.password)
            .cloned()
        else {
            return Ok(None);
        };
        Ok(Some(state.open_session(&user.user_name, user.id)))
    }

    async fn login_hash(&self, credentials: &Credentials) -> Result<Option<Session>, ClientError> {
        // Stored passwords double as their own hash here
        let mut state = self.enter("login_hash")?;
        let Some(user) = state
            .users
            .iter()
            .find(|u| u.user_name == credentials.username && u.password == credentials.password)
            .cloned()
        else {
            return Ok(None);
        };
        Ok(Some(state.open_session(&user.user_name, user.id)))
    }

    async fn is_valid_session(&self, user_name: &str) -> Result<bool, ClientError> {
        let state = self.enter("is_valid_session")?;
        Ok(state
            .sessions
            .get(user_name)
            .is_some_and(|s| !s.is_expired_now()))
    }

    async fn validate_session(&self, user_name: &str) -> Result<Option<Session>, ClientError> {
        let mut state = self.enter("validate_session")?;
        let now = now_ms();
        match state.sessions.get(user_name).map(|s| s.is_expired(now)) {
            None => Ok(None),
            Some(true) => {
                state.sessions.remove(user_name);
                Ok(None)
            }
            Some(false) => Ok(state.sessions.get_mut(user_name).map(|session| {
                session.timer = now;
                session.clone()
            })),
        }
    }

    async fn delete_session(&self, user_name: &str) -> Result<Option<Session>, ClientError> {
        Ok(self.enter("delete_session")?.sessions.remove(user_name))
    }
}

#[async_trait]
impl ChatApi for FakeBackend {
    async fn personalities(&self) -> Result<Vec<ChatPersonality>, ClientError> {
        Ok(self.enter("personalities")?.personalities.clone())
    }

    async fn register_chat(
        &self,
        id: UserId,
        personality: &ChatPersonality,
    ) -> Result<Option<i32>, ClientError> {
        let mut state = self.enter("register_chat")?;
        if state.chats.contains_key(&id) {
            return Ok(None);
        }
        state.chats.insert(id, personality.clone());
        Ok(Some(personality.id))
    }

    async fn chat_exists(&self, id: UserId) -> Result<bool, ClientError> {
        Ok(self.enter("chat_exists")?.chats.contains_key(&id))
    }

    async fn send_chat(&self, id: UserId, message: &str) -> Result<String, ClientError> {
        let state = self.enter("send_chat")?;
        let personality = state.chats.get(&id).ok_or_else(|| status("send_chat", 404))?;
        Ok(format!("{} heard: {message}", personality.name))
    }

    async fn delete_chat(&self, id: UserId) -> Result<bool, ClientError> {
        Ok(self.enter("delete_chat")?.chats.remove(&id).is_some())
    }
}
