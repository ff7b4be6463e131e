use crate::model::{
    CivilInspection, DailyReport, GeodeticInspection, Kind, NcrReport, RemarkReport,
};
use crate::store::backend::StorageBackend;
use crate::store::RecordStore;
use serde::Serialize;

/// Record counts per collection. Unreadable collections count as empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Dashboard {
    pub geodetic: usize,
    pub civil: usize,
    pub ncr: usize,
    pub remark: usize,
    pub daily: usize,
    pub open_ncr: usize,
    pub closed_ncr: usize,
}

impl Dashboard {
    pub fn total(&self, kind: Kind) -> usize {
        match kind {
            Kind::Geodetic => self.geodetic,
            Kind::Civil => self.civil,
            Kind::Ncr => self.ncr,
            Kind::Remark => self.remark,
            Kind::Daily => self.daily,
        }
    }
}

pub fn run<B: StorageBackend>(store: &RecordStore<B>) -> Dashboard {
    let ncrs = store.load::<NcrReport>();
    let closed_ncr = ncrs.iter().filter(|n| n.is_closed()).count();

    Dashboard {
        geodetic: store.load::<GeodeticInspection>().len(),
        civil: store.load::<CivilInspection>().len(),
        ncr: ncrs.len(),
        remark: store.load::<RemarkReport>().len(),
        daily: store.load::<DailyReport>().len(),
        open_ncr: ncrs.len() - closed_ncr,
        closed_ncr,
    }
}
