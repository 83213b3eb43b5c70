//! Unit tests for the object contract, locks, properties, and registry.

use std::any::Any;
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::Arc;

use cosim_core::{ObjectId, Pass, PassSet, Rank, Timestamp};

use crate::{
    ObjectError, ObjectModel, ObjectType, PropertyDef, PropertyValue, SimObject, TypeRegistry,
};

// ── Helpers ───────────────────────────────────────────────────────────────────

/// Minimal model with one writable integer property and a veto switch.
#[derive(Default)]
struct Meter {
    reading:    AtomicI64,
    read_only:  AtomicBool,
}

impl ObjectModel for Meter {
    fn notify(&self, _property: &str, _value: &PropertyValue) -> bool {
        !self.read_only.load(Ordering::Relaxed)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

fn meter_type() -> ObjectType {
    ObjectType::new("meter", Box::new(|| Box::new(Meter::default()) as Box<dyn ObjectModel>))
        .property(PropertyDef::new(
            "reading",
            |m| {
                m.downcast_ref::<Meter>()
                    .map(|m| PropertyValue::Int(m.reading.load(Ordering::Relaxed)))
            },
            |m, v| match (m.downcast_ref::<Meter>(), v.as_i64()) {
                (Some(m), Some(i)) => {
                    m.reading.store(i, Ordering::Relaxed);
                    true
                }
                _ => false,
            },
        ))
}

fn meter_object(start: Timestamp) -> SimObject {
    let otype = Arc::new(meter_type());
    let model = otype.create();
    SimObject::new(ObjectId(0), "meter_1", Rank::ZERO, None, otype, model, start)
}

// ── Spinlock ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod lock_tests {
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::sync::Arc;

    use crate::ObjectLock;

    #[test]
    fn try_lock_fails_while_held() {
        let lock = ObjectLock::new();
        let guard = lock.lock();
        assert!(lock.try_lock().is_none());
        drop(guard);
        assert!(lock.try_lock().is_some());
    }

    #[test]
    fn guard_releases_on_drop() {
        let lock = ObjectLock::new();
        {
            let _guard = lock.lock();
            assert!(lock.is_locked());
        }
        assert!(!lock.is_locked());
    }

    #[test]
    fn increments_under_lock_are_not_lost() {
        const THREADS: usize = 4;
        const ROUNDS: usize = 2_000;

        let lock = Arc::new(ObjectLock::new());
        let counter = Arc::new(AtomicU64::new(0));

        let handles: Vec<_> = (0..THREADS)
            .map(|_| {
                let lock = Arc::clone(&lock);
                let counter = Arc::clone(&counter);
                std::thread::spawn(move || {
                    for _ in 0..ROUNDS {
                        let _guard = lock.lock();
                        // Deliberately non-atomic read-modify-write: the lock
                        // is what makes it safe.
                        let v = counter.load(Ordering::Relaxed);
                        counter.store(v + 1, Ordering::Relaxed);
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        assert_eq!(counter.load(Ordering::Relaxed), (THREADS * ROUNDS) as u64);
    }
}

// ── Registry ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod registry_tests {
    use super::*;

    #[test]
    fn register_and_lookup() {
        let mut reg = TypeRegistry::new();
        assert!(reg.is_empty());
        reg.register(meter_type()).unwrap();
        assert_eq!(reg.len(), 1);
        assert!(!reg.is_empty());
        assert!(reg.contains("meter"));
        let otype = reg.get("meter").unwrap();
        assert_eq!(otype.key(), "meter");
        assert_eq!(otype.property_count(), 1);
    }

    #[test]
    fn duplicate_key_is_an_error() {
        let mut reg = TypeRegistry::new();
        reg.register(meter_type()).unwrap();
        assert!(reg.register(meter_type()).is_err());
        assert_eq!(reg.len(), 1);
    }

    #[test]
    fn unknown_key_is_an_error() {
        let reg = TypeRegistry::new();
        assert!(reg.get("transformer").is_err());
    }

    #[test]
    fn factory_builds_fresh_instances() {
        let otype = meter_type();
        let a = otype.create();
        let b = otype.create();
        // Distinct allocations — mutating one must not touch the other.
        let a = a.as_any().downcast_ref::<Meter>().unwrap();
        let b = b.as_any().downcast_ref::<Meter>().unwrap();
        a.reading.store(7, Ordering::Relaxed);
        assert_eq!(b.reading.load(Ordering::Relaxed), 0);
    }

    #[test]
    fn narrowed_pass_set_sticks() {
        let otype = ObjectType::new(
            "probe",
            Box::new(|| Box::new(Meter::default()) as Box<dyn ObjectModel>),
        )
        .passes(PassSet::EMPTY.with(PassSet::COMMIT));
        assert!(otype.pass_set().contains(Pass::Commit.flag()));
        assert!(!otype.pass_set().contains(Pass::Sync.flag()));
    }
}

// ── Handle: lifecycle defaults and scheduling state ───────────────────────────

#[cfg(test)]
mod handle_tests {
    use super::*;

    #[test]
    fn lifecycle_defaults_return_never() {
        let obj = meter_object(Timestamp::ZERO);
        for pass in [Pass::Presync, Pass::Sync, Pass::Postsync, Pass::Commit] {
            let ts = obj.lifecycle(pass, Timestamp::ZERO, Timestamp::ZERO).unwrap();
            assert!(ts.is_never(), "{pass} default should be NEVER");
        }
    }

    #[test]
    fn clock_and_valid_to_seeded_from_start() {
        let obj = meter_object(Timestamp(3600));
        assert_eq!(obj.clock(), Timestamp(3600));
        assert_eq!(obj.valid_to(), Timestamp(3600));
    }

    #[test]
    fn parent_is_a_plain_back_reference() {
        let otype = Arc::new(meter_type());
        let model = otype.create();
        let child = SimObject::new(
            ObjectId(5), "meter_child", Rank(1), Some(ObjectId(2)), otype, model,
            Timestamp::ZERO,
        );
        assert_eq!(child.parent(), Some(ObjectId(2)));
        assert_eq!(child.rank(), Rank(1));
    }
}

// ── Handle: property access ───────────────────────────────────────────────────

#[cfg(test)]
mod property_tests {
    use super::*;

    #[test]
    fn read_write_roundtrip() {
        let obj = meter_object(Timestamp::ZERO);
        obj.write_property("reading", PropertyValue::Int(42)).unwrap();
        assert_eq!(obj.read_property("reading").unwrap(), PropertyValue::Int(42));
    }

    #[test]
    fn unknown_property_errors() {
        let obj = meter_object(Timestamp::ZERO);
        match obj.read_property("voltage") {
            Err(ObjectError::UnknownProperty { property, .. }) => {
                assert_eq!(property, "voltage");
            }
            other => panic!("expected UnknownProperty, got {other:?}"),
        }
    }

    #[test]
    fn mismatched_value_variant_is_rejected() {
        let obj = meter_object(Timestamp::ZERO);
        let result = obj.write_property("reading", PropertyValue::Text("high".into()));
        assert!(matches!(result, Err(ObjectError::Rejected { .. })));
    }

    #[test]
    fn notify_can_veto() {
        let obj = meter_object(Timestamp::ZERO);
        obj.model()
            .as_any()
            .downcast_ref::<Meter>()
            .unwrap()
            .read_only
            .store(true, Ordering::Relaxed);

        let result = obj.write_property("reading", PropertyValue::Int(1));
        assert!(matches!(result, Err(ObjectError::Vetoed { .. })));
        // Vetoed write must not have touched the field.
        assert_eq!(obj.read_property("reading").unwrap(), PropertyValue::Int(0));
    }

    #[test]
    fn successful_write_resets_valid_to() {
        let obj = meter_object(Timestamp::ZERO);
        // Pretend the object advertised a far-future answer.
        obj.set_clock(Timestamp(100));
        obj.set_valid_to(Timestamp(10_000));

        obj.write_property("reading", PropertyValue::Int(9)).unwrap();
        assert_eq!(
            obj.valid_to(),
            Timestamp(100),
            "external write must invalidate the advertised answer"
        );
    }
}

// ── PropertyValue coercions ───────────────────────────────────────────────────

#[cfg(test)]
mod value_tests {
    use crate::PropertyValue;

    #[test]
    fn as_f64_widens_ints() {
        assert_eq!(PropertyValue::Int(3).as_f64(), Some(3.0));
        assert_eq!(PropertyValue::Float(2.5).as_f64(), Some(2.5));
        assert_eq!(PropertyValue::Bool(true).as_f64(), None);
    }

    #[test]
    fn variant_accessors_reject_other_variants() {
        assert_eq!(PropertyValue::Bool(true).as_bool(), Some(true));
        assert_eq!(PropertyValue::Int(1).as_bool(), None);
        assert_eq!(PropertyValue::Text("on".into()).as_str(), Some("on"));
        assert_eq!(PropertyValue::Float(1.0).as_str(), None);
        assert_eq!(PropertyValue::Float(1.0).as_i64(), None);
    }

    #[test]
    fn display() {
        assert_eq!(PropertyValue::Int(7).to_string(), "7");
        assert_eq!(PropertyValue::Text("ok".into()).to_string(), "ok");
    }
}
