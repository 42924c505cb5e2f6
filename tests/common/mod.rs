//! Shared test fixtures and utilities for integration tests.
//!
//! # Available Fixtures
//!
//! - [`MockNode`]: an in-memory host DOM implementing `HostNode`
//! - [`RecordingSurface`]: a `TooltipSurface` that records every call
//! - [`CountingSource`]: a dataset source that counts fetches and can fail
//! - [`SharedStore`]: in-memory partitions shared between stores, counting writes
//! - `p5_dataset`: a small dataset with common and cold symbols

#![allow(dead_code)] // Helpers used across different integration test crates

use hover_docs::{
    Config, DatasetSource, DocStore, HostNode, MemoryPartitionStore, Partition, PartitionStore,
    Point, Rect, Size, StaticSource, StoreError, TooltipContent, TooltipSurface, Viewport,
};
use hover_docs::store::StoredPartition;
use rstest::fixture;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::{Rc, Weak};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Symbols eagerly loaded by the fixtures.
pub const COMMON: &[&str] = &["rect", "fill", "background"];

/// A dataset with three common and three cold symbols.
#[fixture]
pub fn p5_dataset() -> String {
    serde_json::json!({
        "rect": {
            "description": "<p>Draws a rectangle</p>",
            "params": [
                {"name": "x", "type": "Number", "description": "<p>x-coordinate of the rectangle.</p>"},
                {"name": "y", "type": "Number"},
                {"name": "w", "type": "Number"},
                {"name": "h", "type": "Number", "optional": true}
            ]
        },
        "fill": {"description": "<p>Sets the color used to fill shapes.</p>"},
        "background": {"description": "<p>Sets the <code>canvas</code> color.</p>"},
        "noLoop": {"description": "<p>Stops <code>draw()</code> from running.</p>"},
        "random": {
            "description": "Returns a random number.",
            "return": {"type": "Number", "description": "the random number"}
        },
        "lerp": {}
    })
    .to_string()
}

pub fn common_symbols() -> Vec<String> {
    COMMON.iter().map(|s| (*s).to_string()).collect()
}

pub fn test_config() -> Config {
    hover_docs::tracing::init();
    Config {
        common_symbols: common_symbols(),
        ..Config::default()
    }
}

// --- Dataset source ---

/// Serves a fixed dataset and counts how often it was fetched.
#[derive(Debug, Clone)]
pub struct CountingSource {
    inner: StaticSource,
    fetches: Arc<AtomicUsize>,
    fail: bool,
}

impl CountingSource {
    pub fn new(dataset: &str) -> Self {
        Self {
            inner: StaticSource::new(dataset.as_bytes().to_vec()),
            fetches: Arc::new(AtomicUsize::new(0)),
            fail: false,
        }
    }

    /// A source whose every fetch fails, as if the network were down.
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::new("{}")
        }
    }

    pub fn fetches(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

impl DatasetSource for CountingSource {
    async fn fetch(&self) -> Result<Vec<u8>, StoreError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        // let concurrent loaders interleave
        tokio::task::yield_now().await;
        if self.fail {
            return Err(StoreError::Fetch("network unreachable".to_string()));
        }
        self.inner.fetch().await
    }
}

// --- Persistence ---

/// In-memory partitions that survive across stores, like a browser's
/// persistent storage survives page reloads.
#[derive(Debug, Clone, Default)]
pub struct SharedStore {
    inner: Arc<MemoryPartitionStore>,
    reads: Arc<Mutex<HashMap<Partition, usize>>>,
    writes: Arc<Mutex<HashMap<Partition, usize>>>,
}

impl SharedStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reads(&self, partition: Partition) -> usize {
        count(&self.reads, partition)
    }

    pub fn writes(&self, partition: Partition) -> usize {
        count(&self.writes, partition)
    }

    pub fn contains(&self, partition: Partition) -> bool {
        self.inner.contains(partition)
    }

    pub fn remove(&self, partition: Partition) {
        self.inner.remove(partition);
    }
}

impl PartitionStore for SharedStore {
    async fn read(&self, partition: Partition) -> Result<Option<StoredPartition>, StoreError> {
        *self.reads.lock().unwrap().entry(partition).or_insert(0) += 1;
        self.inner.read(partition).await
    }

    async fn write(
        &self,
        partition: Partition,
        data: Arc<StoredPartition>,
    ) -> Result<(), StoreError> {
        *self.writes.lock().unwrap().entry(partition).or_insert(0) += 1;
        self.inner.write(partition, data).await
    }
}

fn count(counts: &Mutex<HashMap<Partition, usize>>, partition: Partition) -> usize {
    counts.lock().unwrap().get(&partition).copied().unwrap_or(0)
}

pub type TestStore = DocStore<SharedStore, CountingSource>;

/// A store over `persistence` serving `source`, with the fixture allow-list.
pub fn store(persistence: &SharedStore, source: &CountingSource) -> TestStore {
    hover_docs::tracing::init();
    DocStore::new(Some(persistence.clone()), source.clone(), &common_symbols())
}

// --- Host DOM ---

#[derive(Debug)]
struct NodeData {
    tag: String,
    class: String,
    text: String,
    rect: Rect,
    parent: RefCell<Weak<NodeData>>,
    children: RefCell<Vec<Rc<NodeData>>>,
}

/// An element of the in-memory host page.
#[derive(Debug, Clone)]
pub struct MockNode(Rc<NodeData>);

impl MockNode {
    pub fn new(tag: &str, class: &str, text: &str, rect: Rect) -> Self {
        Self(Rc::new(NodeData {
            tag: tag.to_string(),
            class: class.to_string(),
            text: text.to_string(),
            rect,
            parent: RefCell::new(Weak::new()),
            children: RefCell::new(Vec::new()),
        }))
    }

    pub fn append(&self, child: &Self) -> &Self {
        *child.0.parent.borrow_mut() = Rc::downgrade(&self.0);
        self.0.children.borrow_mut().push(Rc::clone(&child.0));
        self
    }
}

impl HostNode for MockNode {
    fn tag_name(&self) -> &str {
        &self.0.tag
    }

    fn class_name(&self) -> &str {
        &self.0.class
    }

    fn parent(&self) -> Option<Self> {
        self.0.parent.borrow().upgrade().map(MockNode)
    }

    fn children(&self) -> Vec<Self> {
        self.0.children.borrow().iter().cloned().map(MockNode).collect()
    }

    fn text_content(&self) -> String {
        self.0.text.clone()
    }

    fn bounding_rect(&self) -> Rect {
        self.0.rect
    }
}

/// A CodeMirror-like editor: `div.cm-editor > div.cm-line > span.cm-*`.
pub struct Editor {
    pub root: MockNode,
    pub line: MockNode,
    pub tokens: Vec<MockNode>,
    /// An element outside the editor.
    pub outside: MockNode,
}

impl Editor {
    /// One line of tokens, each 40px wide, laid out left to right from x=0.
    pub fn with_line(words: &[&str]) -> Self {
        let root = MockNode::new("div", "cm-editor", "", Rect::new(0.0, 0.0, 800.0, 400.0));
        let line = MockNode::new("div", "cm-line", "", Rect::new(0.0, 0.0, 800.0, 20.0));
        root.append(&line);

        let tokens: Vec<MockNode> = words
            .iter()
            .enumerate()
            .map(|(i, word)| {
                let token = MockNode::new(
                    "span",
                    "cm-variable",
                    word,
                    Rect::new(i as f64 * 40.0, 0.0, 40.0, 20.0),
                );
                line.append(&token);
                token
            })
            .collect();

        let outside = MockNode::new("div", "toolbar", "", Rect::new(0.0, 500.0, 800.0, 40.0));
        Self {
            root,
            line,
            tokens,
            outside,
        }
    }

    pub fn token(&self, text: &str) -> &MockNode {
        self.tokens
            .iter()
            .find(|t| t.text_content().trim() == text)
            .unwrap_or_else(|| panic!("no token '{}'", text))
    }
}

// --- Tooltip surface ---

/// Records what the presenter asked the host to do.
#[derive(Debug, Clone)]
pub struct RecordingSurface {
    pub viewport: Viewport,
    pub panel: Size,
    pub rendered: Vec<TooltipContent>,
    pub positions: Vec<Point>,
    pub visible: bool,
    pub highlight: Option<Rect>,
    pub locked: bool,
}

impl Default for RecordingSurface {
    fn default() -> Self {
        Self {
            viewport: Viewport::new(800.0, 600.0),
            panel: Size::new(300.0, 120.0),
            rendered: Vec::new(),
            positions: Vec::new(),
            visible: false,
            highlight: None,
            locked: false,
        }
    }
}

impl RecordingSurface {
    /// Description text of the panel currently rendered.
    pub fn description(&self) -> Option<&str> {
        self.rendered.last().map(|c| c.description.as_str())
    }

    pub fn last_position(&self) -> Option<Point> {
        self.positions.last().copied()
    }
}

impl TooltipSurface for RecordingSurface {
    fn viewport(&self) -> Viewport {
        self.viewport
    }

    fn panel_size(&self) -> Size {
        self.panel
    }

    fn render(&mut self, content: &TooltipContent) {
        self.rendered.push(content.clone());
    }

    fn show_at(&mut self, position: Point) {
        self.positions.push(position);
        self.visible = true;
    }

    fn hide(&mut self) {
        self.visible = false;
    }

    fn highlight(&mut self, rect: Rect) {
        self.highlight = Some(rect);
    }

    fn clear_highlight(&mut self) {
        self.highlight = None;
    }

    fn set_lock_indicator(&mut self, locked: bool) {
        self.locked = locked;
    }
}
