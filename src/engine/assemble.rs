// src/engine/assemble.rs
//
// Turns a flat field stream back into records. A record ends when the
// identity key shows up again while one is open; whatever is open when the
// stream runs out is the last record.
//
// Known limitation: a stream that never carries the identity key collapses
// into a single record. Boundaries are inferred from repetition only.

use crate::engine::route::{GroupStaging, RouteTable, Router};
use crate::engine::types::{FlatField, Record};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum State {
    Idle,
    Accumulating,
}

/// A finished record: the main row plus the items staged per route group
/// (indexed like `RouteTable::routes`).
#[derive(Clone, Debug, Default)]
pub struct Assembled {
    pub main: Record,
    pub groups: Vec<Vec<Record>>,
}

pub struct Assembler {
    identity: String,
    router: Router,
    state: State,
    main: Record,
    staging: Vec<GroupStaging>,
}

impl Assembler {
    pub fn new(identity: &str, routes: RouteTable) -> Self {
        let router = Router::new(routes);
        let staging = vec![GroupStaging::default(); router.routes().len()];
        Self { identity: identity.to_string(), router, state: State::Idle, main: Record::new(), staging }
    }

    pub fn state(&self) -> State {
        self.state
    }

    pub fn router(&self) -> &Router {
        &self.router
    }

    /// Feeds one field. Returns the previous record when this field opens a new one.
    pub fn push(&mut self, field: FlatField) -> Option<Assembled> {
        let FlatField { key, value } = field;
        let value = value.normalized();

        let done = if key == self.identity && self.state == State::Accumulating {
            Some(self.take())
        } else {
            None
        };

        match self.router.routing(&key) {
            Some(routing) => {
                for (ix, column) in &routing.groups {
                    self.staging[*ix].stage(column, value.clone());
                }
                if routing.in_main {
                    self.main.insert(key, value);
                }
            }
            None => self.main.insert(key, value),
        }
        self.state = State::Accumulating;
        done
    }

    /// Input exhausted: emits the open record, if any.
    pub fn finish(mut self) -> Option<Assembled> {
        match self.state {
            State::Accumulating => Some(self.take()),
            State::Idle => None,
        }
    }

    fn take(&mut self) -> Assembled {
        let groups = self
            .staging
            .iter_mut()
            .map(|g| std::mem::take(g).into_items())
            .collect();
        self.state = State::Idle;
        Assembled { main: std::mem::take(&mut self.main), groups }
    }
}

/// Runs a whole field stream through a fresh assembler.
pub fn assemble_all<I>(identity: &str, routes: RouteTable, fields: I) -> Vec<Assembled>
where
    I: IntoIterator<Item = FlatField>,
{
    let mut asm = Assembler::new(identity, routes);
    let mut out: Vec<Assembled> = fields.into_iter().filter_map(|f| asm.push(f)).collect();
    out.extend(asm.finish());
    out
}
