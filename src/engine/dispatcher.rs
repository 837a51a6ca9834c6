use std::marker::PhantomData;

use serde_json::{json, Map, Value};

use crate::{
    audio::BufferPool,
    engine::{AnyEngine, Engine, EngineKind, Processor, Role},
    AudioConfig, EngineError,
};

/*
Engine Dispatch
===============

A dispatcher holds every engine that can fill one position in the graph and
forwards each block to the selected one. The set is closed and known when
the graph is built, so it is a tuple, and dispatch is a `match` on the
selected index:

  EngineDispatcher<Effect, (Delay, Chorus)>
                                  ┌─────────┐
      process(data) ── selected ──│ 0 Delay │──→ output
                          = 1  ╲  └─────────┘
                                ╲ ┌──────────┐
                                 ╲│ 1 Chorus │──→ output
                                  └──────────┘

Every engine in the set is initialized together, so switching never starts
from a cold engine. All of them keep their props across switches, and all
of them are saved, not only the selected one:

  {
    "selected": "Chorus",
    "engines": { "Delay": { ... }, "Chorus": { ... } }
  }
*/

/// A fixed set of engines that all fill role `R`.
///
/// Implemented for tuples of one to four [`Processor<R>`]s. Indices follow
/// tuple order and match [`EngineSet::NAMES`].
pub trait EngineSet<R: Role>: Send {
    const NAMES: &'static [&'static str];

    fn get(&self, index: usize) -> &dyn AnyEngine;
    fn get_mut(&mut self, index: usize) -> &mut dyn AnyEngine;
    fn init(&mut self, index: usize, config: &AudioConfig);
    fn reset(&mut self, index: usize);
    fn process<'a>(
        &'a mut self,
        index: usize,
        pool: &'a BufferPool,
        data: R::Input<'a>,
    ) -> R::Output<'a>;
}

#[cold]
#[inline(never)]
fn out_of_range(index: usize, len: usize) -> ! {
    panic!("engine index {index} out of range for a set of {len}");
}

macro_rules! impl_engine_set {
    ($len:literal => $($idx:tt : $T:ident),+) => {
        impl<R: Role, $($T: Processor<R>),+> EngineSet<R> for ($($T,)+) {
            const NAMES: &'static [&'static str] = &[$($T::NAME),+];

            fn get(&self, index: usize) -> &dyn AnyEngine {
                match index {
                    $($idx => &self.$idx,)+
                    _ => out_of_range(index, $len),
                }
            }

            fn get_mut(&mut self, index: usize) -> &mut dyn AnyEngine {
                match index {
                    $($idx => &mut self.$idx,)+
                    _ => out_of_range(index, $len),
                }
            }

            fn init(&mut self, index: usize, config: &AudioConfig) {
                match index {
                    $($idx => self.$idx.init(config),)+
                    _ => out_of_range(index, $len),
                }
            }

            fn reset(&mut self, index: usize) {
                match index {
                    $($idx => Engine::reset(&mut self.$idx),)+
                    _ => out_of_range(index, $len),
                }
            }

            #[inline]
            fn process<'a>(
                &'a mut self,
                index: usize,
                pool: &'a BufferPool,
                data: R::Input<'a>,
            ) -> R::Output<'a> {
                match index {
                    $($idx => Processor::<R>::process(&mut self.$idx, pool, data),)+
                    _ => out_of_range(index, $len),
                }
            }
        }
    };
}

impl_engine_set!(1 => 0: A);
impl_engine_set!(2 => 0: A, 1: B);
impl_engine_set!(3 => 0: A, 1: B, 2: C);
impl_engine_set!(4 => 0: A, 1: B, 2: C, 3: D);

/// Holds the engines for one graph position and runs the selected one.
pub struct EngineDispatcher<R: Role, S: EngineSet<R>> {
    engines: S,
    selected: usize,
    reset_on_switch: bool,
    _role: PhantomData<fn() -> R>,
}

impl<R: Role, S: EngineSet<R>> EngineDispatcher<R, S> {
    /// With `reset_on_switch`, selecting an engine runs its
    /// [`Engine::reset`] so it starts from silence. Without it, an engine
    /// resumes where it stopped (voices still releasing, delay lines still
    /// full).
    pub fn new(engines: S, reset_on_switch: bool) -> Self {
        Self {
            engines,
            selected: 0,
            reset_on_switch,
            _role: PhantomData,
        }
    }

    pub fn kind(&self) -> EngineKind {
        R::KIND
    }

    pub fn names(&self) -> &'static [&'static str] {
        S::NAMES
    }

    pub fn len(&self) -> usize {
        S::NAMES.len()
    }

    /// Always false: a set holds at least one engine.
    pub fn is_empty(&self) -> bool {
        S::NAMES.is_empty()
    }

    pub fn selected_index(&self) -> usize {
        self.selected
    }

    pub fn selected_name(&self) -> &'static str {
        S::NAMES[self.selected]
    }

    pub fn current(&self) -> &dyn AnyEngine {
        self.engines.get(self.selected)
    }

    pub fn current_mut(&mut self) -> &mut dyn AnyEngine {
        self.engines.get_mut(self.selected)
    }

    pub fn get(&self, index: usize) -> Option<&dyn AnyEngine> {
        (index < self.len()).then(|| self.engines.get(index))
    }

    /// Typed access, e.g. `dispatcher.engines().1.props()`.
    pub fn engines(&self) -> &S {
        &self.engines
    }

    pub fn engines_mut(&mut self) -> &mut S {
        &mut self.engines
    }

    /// Switch to engine `index`. Selecting the current engine does nothing.
    ///
    /// Neither allocates nor logs, so commands can apply it between blocks
    /// on the audio thread.
    pub fn select(&mut self, index: usize) -> Result<(), EngineError> {
        if index >= self.len() {
            return Err(EngineError::IndexOutOfRange {
                index,
                len: self.len(),
            });
        }
        if index == self.selected {
            return Ok(());
        }
        self.selected = index;
        if self.reset_on_switch {
            self.engines.reset(index);
        }
        Ok(())
    }

    pub fn select_by_name(&mut self, name: &str) -> Result<(), EngineError> {
        let index = S::NAMES
            .iter()
            .position(|n| *n == name)
            .ok_or_else(|| EngineError::UnknownEngine {
                name: name.to_owned(),
            })?;
        self.select(index)
    }

    /// Select the next engine, wrapping around.
    pub fn cycle(&mut self) {
        let next = (self.selected + 1) % self.len();
        // In range by construction
        let _ = self.select(next);
    }

    /// Initialize every engine in the set, not only the selected one.
    pub fn init(&mut self, config: &AudioConfig) {
        for index in 0..self.len() {
            self.engines.init(index, config);
        }
        tracing::debug!(kind = ?R::KIND, engines = ?S::NAMES, "dispatcher initialized");
    }

    #[inline]
    pub fn process<'a>(&'a mut self, pool: &'a BufferPool, data: R::Input<'a>) -> R::Output<'a> {
        self.engines.process(self.selected, pool, data)
    }

    pub fn to_json(&self) -> Value {
        let engines: Map<String, Value> = (0..self.len())
            .map(|i| (S::NAMES[i].to_owned(), self.engines.get(i).to_json()))
            .collect();
        json!({
            "selected": self.selected_name(),
            "engines": engines,
        })
    }

    /// Load props for every engine named in `value`, then the selection.
    ///
    /// Engines missing from the document keep their props. Unknown engine
    /// names are skipped with a warning. On error, engines loaded before the
    /// failing one keep their new props.
    pub fn from_json(&mut self, value: &Value) -> Result<(), EngineError> {
        let Some(doc) = value.as_object() else {
            return Err(EngineError::MalformedDocument {
                key: format!("{:?}", R::KIND),
                reason: "expected an object",
            });
        };

        if let Some(engines) = doc.get("engines") {
            let Some(engines) = engines.as_object() else {
                return Err(EngineError::MalformedDocument {
                    key: "engines".into(),
                    reason: "expected an object keyed by engine name",
                });
            };
            for (name, props) in engines {
                match S::NAMES.iter().position(|n| *n == name.as_str()) {
                    Some(index) => self.engines.get_mut(index).from_json(props)?,
                    None => tracing::warn!(kind = ?R::KIND, engine = %name, "skipping unknown engine in saved state"),
                }
            }
        }

        match doc.get("selected") {
            None => Ok(()),
            Some(Value::String(name)) => self.select_by_name(name),
            Some(_) => Err(EngineError::MalformedDocument {
                key: "selected".into(),
                reason: "expected an engine name",
            }),
        }
    }
}
