//! Fluent builder for constructing an [`Exec`].

use std::sync::Arc;
use std::time::Duration;

use cosim_core::{ObjectId, Rank, RunConfig, SimRng};
use cosim_object::{InitContext, SimObject, TypeRegistry};
use cosim_pool::{PoolMode, ThreadPool};
use cosim_rank::RankIndex;
use rustc_hash::FxHashMap;

use crate::{Exec, ExecError, ExecResult};

/// One declared object, waiting to be created.
struct ObjectSpec {
    name:     String,
    type_key: String,
    rank:     Rank,
    parent:   Option<String>,
}

/// Fluent builder for [`Exec`].
///
/// # Load order
///
/// `build()` runs the load protocol in a fixed order: validate the
/// configuration, create every object through its registered factory,
/// resolve parent links, then call `init` on every object in rank order
/// (parents before children).  Only after every `init` has accepted are the
/// rank index and the thread pool constructed — a rejected configuration
/// fails the load before either exists.
///
/// # Example
///
/// ```rust,ignore
/// let mut exec = ExecBuilder::new(config, registry)
///     .object("feeder_1", "feeder", 0)
///     .child("house_1", "house", 1, "feeder_1")
///     .child("house_2", "house", 1, "feeder_1")
///     .build()?;
/// exec.run(&mut NoopObserver)?;
/// ```
pub struct ExecBuilder {
    config:   RunConfig,
    registry: TypeRegistry,
    specs:    Vec<ObjectSpec>,
}

impl ExecBuilder {
    /// Start a build from a configuration and the run's type registry.
    ///
    /// The registry is owned by the load context; object handles keep their
    /// type descriptors alive afterwards via `Arc`.
    pub fn new(config: RunConfig, registry: TypeRegistry) -> Self {
        Self {
            config,
            registry,
            specs: Vec::new(),
        }
    }

    /// Declare a parentless object of a registered type at `rank`.
    pub fn object(mut self, name: impl Into<String>, type_key: impl Into<String>, rank: u16) -> Self {
        self.specs.push(ObjectSpec {
            name:     name.into(),
            type_key: type_key.into(),
            rank:     Rank(rank),
            parent:   None,
        });
        self
    }

    /// Declare an object whose parent is the previously declared (or later
    /// declared) object `parent`.  The child's rank must exceed the
    /// parent's — parents are dispatched first in every top-down pass.
    pub fn child(
        mut self,
        name:     impl Into<String>,
        type_key: impl Into<String>,
        rank:     u16,
        parent:   impl Into<String>,
    ) -> Self {
        self.specs.push(ObjectSpec {
            name:     name.into(),
            type_key: type_key.into(),
            rank:     Rank(rank),
            parent:   Some(parent.into()),
        });
        self
    }

    /// Validate everything, init every object, and return a ready-to-run
    /// [`Exec`].
    pub fn build(self) -> ExecResult<Exec> {
        self.config.validate().map_err(ExecError::Load)?;
        let start = self.config.start();

        // ── Resolve names (duplicates are a load error) ────────────────────
        let mut names: FxHashMap<String, ObjectId> = FxHashMap::default();
        for (i, spec) in self.specs.iter().enumerate() {
            let id = ObjectId(i as u32);
            if names.insert(spec.name.clone(), id).is_some() {
                return Err(ExecError::DuplicateName(spec.name.clone()));
            }
        }

        // ── Create every object through its factory ───────────────────────
        let mut objects: Vec<Arc<SimObject>> = Vec::with_capacity(self.specs.len());
        for (i, spec) in self.specs.iter().enumerate() {
            let otype = self.registry.get(&spec.type_key).map_err(ExecError::Load)?;

            let parent = match &spec.parent {
                None => None,
                Some(pname) => {
                    let pid = *names.get(pname).ok_or_else(|| ExecError::UnknownParent {
                        object: spec.name.clone(),
                        parent: pname.clone(),
                    })?;
                    let prank = self.specs[pid.index()].rank;
                    if spec.rank <= prank {
                        return Err(ExecError::RankInversion {
                            object:      spec.name.clone(),
                            rank:        spec.rank,
                            parent:      pname.clone(),
                            parent_rank: prank,
                        });
                    }
                    Some(pid)
                }
            };

            let model = otype.create();
            objects.push(Arc::new(SimObject::new(
                ObjectId(i as u32),
                spec.name.clone(),
                spec.rank,
                parent,
                otype,
                model,
                start,
            )));
        }

        // ── Init in rank order: parents before children ───────────────────
        let mut init_order: Vec<ObjectId> =
            (0..objects.len()).map(|i| ObjectId(i as u32)).collect();
        init_order.sort_by_key(|id| (objects[id.index()].rank(), *id));

        for id in init_order {
            let obj = &objects[id.index()];
            let ctx = InitContext {
                id:     obj.id(),
                name:   obj.name(),
                rank:   obj.rank(),
                parent: obj.parent().map(|pid| objects[pid.index()].as_ref()),
            };
            obj.model().init(&ctx).map_err(|err| ExecError::InitRejected {
                object: obj.name().to_string(),
                otype:  obj.type_key().to_string(),
                reason: err.to_string(),
            })?;
        }

        // ── Only now: rank index and thread pool ──────────────────────────
        let mut index = RankIndex::new();
        for obj in &objects {
            index.append(Arc::clone(obj))?;
        }

        let mut pool = match self.config.worker_threads {
            Some(n) => ThreadPool::new(n),
            None    => ThreadPool::with_host_concurrency(),
        };
        if self.config.deterministic {
            pool.set_mode(PoolMode::Deterministic);
        }
        if let Some(ms) = self.config.drain_poll_ms {
            pool.set_drain_poll(Some(Duration::from_millis(ms)));
        }

        let rng = SimRng::new(self.config.seed);

        Ok(Exec {
            clock:       start,
            step_to:     start,
            last_commit: None,
            steps:       0,
            config:      self.config,
            objects,
            names,
            index,
            pool,
            rng,
        })
    }
}
