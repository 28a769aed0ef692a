use dashmap::DashMap;
use parking_lot::Mutex;

use canary_types::{now_unix, Sample, NAN_VALUE};

/// Samples table. A single primary map keyed by id is enough — id already
/// encodes the natural key `(from, to, key)`, so there's no secondary index
/// to keep in sync the way nodes need one for name/target.
#[derive(Default)]
pub struct SampleTable {
    by_id: DashMap<u32, Sample>,
    write_lock: Mutex<()>,
}

impl SampleTable {
    pub fn set(&self, sample: Sample) {
        let _guard = self.write_lock.lock();
        self.by_id.insert(sample.id, sample);
    }

    pub fn set_nan(&self, id: u32) {
        let _guard = self.write_lock.lock();
        if let Some(mut entry) = self.by_id.get_mut(&id) {
            entry.value = NAN_VALUE.to_string();
            entry.ts = now_unix();
        }
    }

    pub fn get(&self, id: u32) -> Option<Sample> {
        self.by_id.get(&id).map(|r| r.value().clone())
    }

    /// Returns 0 for an unknown id so the very first push for a triple is
    /// always accepted by the monotonic-merge rule in spec §4.2.
    pub fn get_ts(&self, id: u32) -> i64 {
        self.by_id.get(&id).map(|r| r.ts).unwrap_or(0)
    }

    pub fn list(&self) -> Vec<Sample> {
        self.by_id.iter().map(|r| r.value().clone()).collect()
    }

    pub fn delete(&self, id: u32) {
        let _guard = self.write_lock.lock();
        self.by_id.remove(&id);
    }

    pub fn cleanup_old(&self, max_age_secs: i64) -> usize {
        let now = now_unix();
        let stale: Vec<u32> = self
            .by_id
            .iter()
            .filter(|r| now - r.value().ts > max_age_secs)
            .map(|r| *r.key())
            .collect();
        for id in &stale {
            self.delete(*id);
        }
        stale.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use canary_types::SampleKey;

    #[test]
    fn unknown_id_ts_is_zero() {
        let table = SampleTable::default();
        assert_eq!(table.get_ts(999), 0);
    }

    #[test]
    fn set_nan_is_noop_when_absent() {
        let table = SampleTable::default();
        table.set_nan(999);
        assert!(table.get(999).is_none());
    }

    #[test]
    fn set_nan_overwrites_value_and_bumps_ts() {
        let table = SampleTable::default();
        let s = Sample::new("a", "b", SampleKey::RttTotal, "123").with_ts(10);
        let id = s.id;
        table.set(s);
        table.set_nan(id);
        let got = table.get(id).unwrap();
        assert_eq!(got.value, NAN_VALUE);
        assert!(got.ts >= 10);
    }

    #[test]
    fn overwrite_by_same_triple_replaces_row() {
        let table = SampleTable::default();
        let s1 = Sample::new("a", "b", SampleKey::RttTotal, "5").with_ts(100);
        let s2 = Sample::new("a", "b", SampleKey::RttTotal, "3").with_ts(50);
        assert_eq!(s1.id, s2.id);
        table.set(s1);
        table.set(s2.clone());
        assert_eq!(table.get(s2.id).unwrap().value, "3");
    }

    #[test]
    fn cleanup_old_removes_stale_only() {
        let table = SampleTable::default();
        let old = Sample::new("a", "b", SampleKey::RttTotal, "1").with_ts(now_unix() - 1000);
        let fresh = Sample::new("c", "d", SampleKey::RttTotal, "2");
        table.set(old.clone());
        table.set(fresh.clone());
        let removed = table.cleanup_old(10);
        assert_eq!(removed, 1);
        assert!(table.get(old.id).is_none());
        assert!(table.get(fresh.id).is_some());
    }
}
