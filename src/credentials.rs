// src/credentials.rs

//! Учётные данные для привязки к каталогу и их стек.
//!
//! Стек живёт в thread-local: `scoped()` кладёт учётку на время блока,
//! все открытия объектов в этом потоке берут верхнюю подходящую.
//! Между потоками стек не разделяется.

use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::fmt;
use std::fs;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::error::DirectoryError;
use crate::models::AuthenticationFlags;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum CredentialKind {
    Anonymous,
    #[default]
    Simple,
    /// Учётка текущего процесса
    Passthrough,
}

#[derive(Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: Option<String>,
    #[serde(default, skip_serializing)]
    pub password: Option<String>,
    #[serde(default)]
    pub kind: CredentialKind,
    /// Сервер, к которому относится учётка; `None` — к любому
    #[serde(default)]
    pub server: Option<String>,
}

impl Credentials {
    pub fn simple(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: Some(username.into()),
            password: Some(password.into()),
            kind: CredentialKind::Simple,
            server: None,
        }
    }

    pub fn anonymous() -> Self {
        Self {
            username: None,
            password: None,
            kind: CredentialKind::Anonymous,
            server: None,
        }
    }

    pub fn passthrough() -> Self {
        Self {
            username: None,
            password: None,
            kind: CredentialKind::Passthrough,
            server: None,
        }
    }

    pub fn for_server(mut self, server: impl Into<String>) -> Self {
        self.server = Some(server.into());
        self
    }

    pub fn authentication_flags(&self) -> AuthenticationFlags {
        match self.kind {
            CredentialKind::Anonymous => AuthenticationFlags::NO_AUTHENTICATION,
            CredentialKind::Simple | CredentialKind::Passthrough => {
                AuthenticationFlags::SECURE_AUTHENTICATION
            }
        }
    }

    /// Подходит ли учётка для сервера (`None` — сервер по умолчанию)
    pub fn applies_to(&self, server: Option<&str>) -> bool {
        match (&self.server, server) {
            (None, _) => true,
            (Some(own), Some(wanted)) => own.eq_ignore_ascii_case(wanted),
            (Some(_), None) => false,
        }
    }

    /// Логин и пароль для `host` из netrc; по умолчанию `~/.netrc`
    pub fn from_netrc(host: &str, path: Option<&Path>) -> Result<Self, DirectoryError> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => default_netrc_path()
                .ok_or_else(|| DirectoryError::NetrcNotFound("home directory is unknown".to_string()))?,
        };
        debug!(host, path = %path.display(), "looking up netrc entry");

        let content = fs::read_to_string(&path)?;
        let entries = parse_netrc(&content);
        let entry = entries
            .iter()
            .find(|e| e.machine.as_deref().is_some_and(|m| m.eq_ignore_ascii_case(host)))
            .or_else(|| entries.iter().find(|e| e.machine.is_none()))
            .ok_or_else(|| DirectoryError::NetrcNotFound(format!("No entry for {} in netrc", host)))?;

        let login = entry
            .login
            .clone()
            .ok_or_else(|| DirectoryError::NetrcNotFound(format!("No login for {} in netrc", host)))?;
        Ok(Credentials::simple(login, entry.password.clone().unwrap_or_default()).for_server(host))
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "********"))
            .field("kind", &self.kind)
            .field("server", &self.server)
            .finish()
    }
}

pub fn default_netrc_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".netrc"))
}

#[derive(Debug, Default)]
struct NetrcEntry {
    /// `None` — запись `default`
    machine: Option<String>,
    login: Option<String>,
    password: Option<String>,
}

fn parse_netrc(content: &str) -> Vec<NetrcEntry> {
    let mut entries: Vec<NetrcEntry> = Vec::new();
    let mut lines = content.lines();
    while let Some(line) = lines.next() {
        let mut tokens = line.split_whitespace();
        while let Some(token) = tokens.next() {
            match token {
                "machine" => entries.push(NetrcEntry {
                    machine: tokens.next().map(str::to_string),
                    ..Default::default()
                }),
                "default" => entries.push(NetrcEntry::default()),
                "login" | "password" | "account" => {
                    let value = tokens.next().map(str::to_string);
                    if let Some(entry) = entries.last_mut() {
                        match token {
                            "login" => entry.login = value,
                            "password" => entry.password = value,
                            _ => {}
                        }
                    }
                }
                "macdef" => {
                    // тело макроса — до пустой строки
                    for body in lines.by_ref() {
                        if body.trim().is_empty() {
                            break;
                        }
                    }
                    break;
                }
                t if t.starts_with('#') => break,
                _ => {}
            }
        }
    }
    entries
}

// ========================================
// Стек учётных данных
// ========================================

#[derive(Debug, Default, Clone)]
pub struct CredentialsCache {
    stack: Vec<Credentials>,
}

impl CredentialsCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, credentials: Credentials) {
        self.stack.push(credentials);
    }

    pub fn pop(&mut self) -> Option<Credentials> {
        self.stack.pop()
    }

    /// Верхняя учётка
    pub fn get(&self) -> Option<&Credentials> {
        self.stack.last()
    }

    /// Верхняя учётка, применимая к серверу
    pub fn get_for(&self, server: Option<&str>) -> Option<&Credentials> {
        self.stack.iter().rev().find(|c| c.applies_to(server))
    }

    /// От нижней к верхней
    pub fn iter(&self) -> impl Iterator<Item = &Credentials> {
        self.stack.iter()
    }

    pub fn clear(&mut self) {
        self.stack.clear();
    }

    /// Оставить нижние `depth` учёток
    pub fn truncate(&mut self, depth: usize) {
        self.stack.truncate(depth);
    }

    pub fn len(&self) -> usize {
        self.stack.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stack.is_empty()
    }
}

thread_local! {
    static CACHE: RefCell<CredentialsCache> = RefCell::new(CredentialsCache::new());
}

pub fn push(credentials: Credentials) {
    CACHE.with(|cache| cache.borrow_mut().push(credentials));
}

pub fn pop() -> Option<Credentials> {
    let popped = CACHE.with(|cache| cache.borrow_mut().pop());
    if popped.is_none() {
        warn!("credentials stack is empty, nothing to pop");
    }
    popped
}

pub fn current() -> Option<Credentials> {
    CACHE.with(|cache| cache.borrow().get().cloned())
}

pub fn current_for(server: Option<&str>) -> Option<Credentials> {
    CACHE.with(|cache| cache.borrow().get_for(server).cloned())
}

pub fn clear() {
    CACHE.with(|cache| cache.borrow_mut().clear());
}

/// Копия стека текущего потока
pub fn snapshot() -> CredentialsCache {
    CACHE.with(|cache| cache.borrow().clone())
}

/// Положить учётку на стек до конца области видимости
pub fn scoped(credentials: Credentials) -> CredentialsGuard {
    let depth = CACHE.with(|cache| {
        let mut cache = cache.borrow_mut();
        let depth = cache.len();
        cache.push(credentials);
        depth
    });
    CredentialsGuard {
        depth,
        _thread_bound: PhantomData,
    }
}

/// Возвращает стек к глубине до `scoped()` при drop, снимая и всё,
/// что положили поверх вручную. Не `Send`: стек у каждого потока свой.
#[must_use = "credentials are popped as soon as the guard is dropped"]
pub struct CredentialsGuard {
    depth: usize,
    _thread_bound: PhantomData<*const ()>,
}

impl Drop for CredentialsGuard {
    fn drop(&mut self) {
        CACHE.with(|cache| cache.borrow_mut().truncate(self.depth));
    }
}
