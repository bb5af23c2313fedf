//! In-memory stand-ins for the GraphQL server and the offline store.

use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use shelf_core::{Book, Category, Comment, UserRef};
use shelf_db::StoreName;

use crate::error::{ClientError, ClientResult};
use crate::graphql::{GraphqlRequest, GraphqlTransport};
use crate::persist::OfflineStore;

// =============================================================================
// Fake Server
// =============================================================================

#[derive(Default)]
struct ServerState {
    books: Vec<Book>,
    categories: Vec<Category>,
    failures: HashMap<&'static str, String>,
    delays: HashMap<&'static str, VecDeque<Duration>>,
    calls: HashMap<&'static str, usize>,
}

/// Answers the marketplace operations from an in-memory catalog.
#[derive(Default)]
pub struct FakeServer {
    state: Mutex<ServerState>,
}

impl FakeServer {
    pub fn with_books(books: Vec<Book>) -> Arc<Self> {
        let server = FakeServer::default();
        server.state.lock().unwrap().books = books;
        Arc::new(server)
    }

    pub fn set_books(&self, books: Vec<Book>) {
        self.state.lock().unwrap().books = books;
    }

    pub fn set_categories(&self, categories: Vec<Category>) {
        self.state.lock().unwrap().categories = categories;
    }

    /// Every later call to `operation` fails with `message`.
    pub fn fail(&self, operation: &'static str, message: &str) {
        self.state
            .lock()
            .unwrap()
            .failures
            .insert(operation, message.to_string());
    }

    pub fn recover(&self, operation: &'static str) {
        self.state.lock().unwrap().failures.remove(operation);
    }

    /// The next call to `operation` waits `delay` before answering.
    pub fn delay_next(&self, operation: &'static str, delay: Duration) {
        self.state
            .lock()
            .unwrap()
            .delays
            .entry(operation)
            .or_default()
            .push_back(delay);
    }

    pub fn calls(&self, operation: &'static str) -> usize {
        self.state
            .lock()
            .unwrap()
            .calls
            .get(operation)
            .copied()
            .unwrap_or(0)
    }

    fn answer(&self, request: &GraphqlRequest) -> ClientResult<Value> {
        let mut state = self.state.lock().unwrap();
        if let Some(message) = state.failures.get(request.operation) {
            return Err(ClientError::GraphQl(message.clone()));
        }

        match request.operation {
            "allBooks" => Ok(json!({
                "allBooks": state.books.iter().map(wire_book).collect::<Vec<_>>()
            })),
            "getBookById" => {
                let id = request.variables["id"].as_str().unwrap_or_default();
                let book = state.books.iter().find(|b| b.id == id).map(wire_book);
                Ok(json!({ "getBookById": book }))
            }
            "addComment" => {
                let id = request.variables["bookId"].as_str().unwrap_or_default().to_string();
                let text = request.variables["comment"].as_str().unwrap_or_default();
                let book = state
                    .books
                    .iter_mut()
                    .find(|b| b.id == id)
                    .ok_or_else(|| ClientError::GraphQl("Book not found".into()))?;
                book.comments.push(Comment::new(
                    text,
                    Some(UserRef {
                        id: Some("u1".into()),
                        first_name: Some("Reader".into()),
                        last_name: None,
                    }),
                ));
                Ok(json!({ "addComment": { "_id": id } }))
            }
            "categories" => Ok(json!({ "categories": state.categories })),
            other => Err(ClientError::GraphQl(format!("Unknown operation {}", other))),
        }
    }
}

/// A book as the server would send it: dollars as a float.
pub fn wire_book(book: &Book) -> Value {
    let mut value = serde_json::to_value(book).unwrap();
    value["price"] = json!(book.price.cents() as f64 / 100.0);
    value
}

#[async_trait]
impl GraphqlTransport for FakeServer {
    async fn execute(&self, request: GraphqlRequest) -> ClientResult<Value> {
        let delay = {
            let mut state = self.state.lock().unwrap();
            *state.calls.entry(request.operation).or_default() += 1;
            state
                .delays
                .get_mut(request.operation)
                .and_then(VecDeque::pop_front)
        };
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        self.answer(&request)
    }
}

// =============================================================================
// Memory Offline Store
// =============================================================================

#[derive(Default)]
struct StoreState {
    records: HashMap<StoreName, Vec<(String, Value)>>,
    fail_next: usize,
    puts: usize,
}

/// Offline store kept in a map, with injectable write failures.
#[derive(Default)]
pub struct MemoryOfflineStore {
    state: Mutex<StoreState>,
}

impl MemoryOfflineStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// The next `n` writes fail with a retryable error.
    pub fn fail_next(&self, n: usize) {
        self.state.lock().unwrap().fail_next = n;
    }

    pub fn records(&self, store: StoreName) -> Vec<(String, Value)> {
        self.state
            .lock()
            .unwrap()
            .records
            .get(&store)
            .cloned()
            .unwrap_or_default()
    }

    pub fn record(&self, store: StoreName, key: &str) -> Option<Value> {
        self.records(store)
            .into_iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
    }

    /// Successful puts so far.
    pub fn put_count(&self) -> usize {
        self.state.lock().unwrap().puts
    }

    fn take_failure(state: &mut StoreState) -> ClientResult<()> {
        if state.fail_next > 0 {
            state.fail_next -= 1;
            return Err(ClientError::Database("injected failure".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl OfflineStore for MemoryOfflineStore {
    async fn put(&self, store: StoreName, key: &str, record: &Value) -> ClientResult<()> {
        let mut state = self.state.lock().unwrap();
        Self::take_failure(&mut state)?;
        state.puts += 1;
        let records = state.records.entry(store).or_default();
        match records.iter_mut().find(|(k, _)| k == key) {
            Some((_, existing)) => *existing = record.clone(),
            None => records.push((key.to_string(), record.clone())),
        }
        Ok(())
    }

    async fn get(&self, store: StoreName, key: &str) -> ClientResult<Option<Value>> {
        Ok(self.record(store, key))
    }

    async fn get_all(&self, store: StoreName) -> ClientResult<Vec<Value>> {
        Ok(self.records(store).into_iter().map(|(_, v)| v).collect())
    }

    async fn delete(&self, store: StoreName, key: &str) -> ClientResult<bool> {
        let mut state = self.state.lock().unwrap();
        Self::take_failure(&mut state)?;
        let records = state.records.entry(store).or_default();
        let before = records.len();
        records.retain(|(k, _)| k != key);
        Ok(records.len() != before)
    }

    async fn replace_all(&self, store: StoreName, records: &[(String, Value)]) -> ClientResult<()> {
        let mut state = self.state.lock().unwrap();
        Self::take_failure(&mut state)?;
        state.records.insert(store, records.to_vec());
        Ok(())
    }
}
