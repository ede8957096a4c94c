//! Placement engine module
//!
//! The first-fit core of the scheduler. Given one routing operation and the
//! instant to search from, the engine walks working shift windows forward,
//! scans each candidate machine for the first free gap, intersects it with
//! an eligible operator's working window, and emits chunks until the
//! operation's full duration is covered. The first emitted chunk pins both
//! the machine and the operator for the rest of the operation, across shift
//! and day boundaries.

use std::collections::{HashMap, HashSet};
use std::time::Instant;

use anyhow::Result;
use chrono::{DateTime, Duration, Utc};
use thiserror::Error;
use tracing::{debug, trace};

use crate::application::services::availability::AvailabilityService;
use crate::application::services::calendar;
use crate::application::services::compatibility::CompatibilityFilter;
use crate::application::services::shift_capacity::ShiftCapacityService;
use crate::application::services::substitution::SubstitutionResolver;
use crate::domain::entities::{EntryStatus, Machine, RoutingOperation, ScheduleEntry};
use crate::domain::repositories::SchedulingStore;
use crate::domain::value_objects::Shift;

/// Days of empty candidates scanned before an operation is declared
/// unplaceable
const SEARCH_HORIZON_DAYS: i64 = 30;

/// Minimum useful chunk length
const MIN_CHUNK_MINUTES: i64 = 1;

/// Why an operation could not be placed
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlacementFailure {
    /// The substitution resolver yielded no candidate machines
    #[error("no candidate machine")]
    NoCandidateMachine,

    /// Candidate machines exist but no operator passes the compatibility
    /// filter within the search horizon
    #[error("no qualified operator")]
    NoQualifiedOperator,

    /// Machines and operators exist but no usable gap was found within the
    /// search horizon
    #[error("capacity exhausted within the search horizon")]
    CapacityExhausted,

    /// The wall-clock budget for the pass ran out
    #[error("placement wall-clock budget exceeded")]
    TimeoutExceeded,
}

/// Domain outcome of a placement attempt
///
/// The outer `anyhow::Result` carries storage failures; the inner result is
/// the tagged scheduling outcome.
pub type PlacementResult = std::result::Result<Vec<ScheduleEntry>, PlacementFailure>;

/// One placement request for a single routing operation
pub struct PlacementRequest<'a> {
    /// The operation to place
    pub operation: &'a RoutingOperation,
    /// Earliest instant the search may start from (routing boundary)
    pub search_from: DateTime<Utc>,
    /// The wall clock "now" anchoring the never-today floor
    pub now: DateTime<Utc>,
    /// Wall-clock deadline for the surrounding pass, if any
    pub deadline: Option<Instant>,
    /// Entry ids to treat as absent (displacement simulation)
    pub ignore_entries: &'a HashSet<u64>,
}

/// First-fit placement over machines, operators and shift windows
pub struct PlacementEngine<'a> {
    resolver: &'a SubstitutionResolver,
    availability: &'a AvailabilityService,
    capacity: &'a ShiftCapacityService,
    filter: CompatibilityFilter,
}

impl<'a> PlacementEngine<'a> {
    /// Creates an engine over the pass's service snapshots
    pub fn new(
        resolver: &'a SubstitutionResolver,
        availability: &'a AvailabilityService,
        capacity: &'a ShiftCapacityService,
    ) -> Self {
        Self {
            resolver,
            availability,
            capacity,
            filter: CompatibilityFilter::new(),
        }
    }

    /// Places one operation, returning its chunks in chronological order
    ///
    /// The chunks are drafts: ids are zero and nothing is written to the
    /// store. Every chunk honors machine non-overlap, operator working
    /// windows, shift containment, and the operator/machine lock; their
    /// durations sum to the operation's total minutes.
    ///
    /// # Arguments
    ///
    /// * `store` - Backing store for machine schedules
    /// * `request` - The operation and search bounds
    pub fn place<S: SchedulingStore + ?Sized>(
        &self,
        store: &S,
        request: &PlacementRequest<'_>,
    ) -> Result<PlacementResult> {
        let operation = request.operation;
        let total_minutes = operation.total_minutes();
        if total_minutes <= 0 {
            return Ok(Ok(Vec::new()));
        }

        let mut earliest = request
            .search_from
            .max(calendar::next_business_day_start(request.now));
        if let Some(floor) = operation.earliest_start {
            earliest = earliest.max(floor);
        }

        if operation.machine_type.is_outsource() {
            return Ok(self.place_outsource(operation, earliest, total_minutes));
        }

        let candidates = self.resolver.candidates(operation);
        if candidates.is_empty() {
            return Ok(Err(PlacementFailure::NoCandidateMachine));
        }

        // An operator existing for some candidate machine (ignoring time)
        // decides between NoQualifiedOperator and CapacityExhausted later.
        let operators_exist = candidates.iter().any(|machine| {
            !self
                .filter
                .eligible_operators(self.availability.roster(), machine, operation, None)
                .is_empty()
        });

        let mut schedules = HashMap::new();
        for machine in &candidates {
            let entries = self.machine_schedule(store, &machine.machine_id, request.ignore_entries)?;
            schedules.insert(machine.machine_id.clone(), entries);
        }

        // Operators may be booked on machines outside the candidate set;
        // their own schedules bound the usable slice of every gap.
        let mut operator_schedules: HashMap<u64, Vec<ScheduleEntry>> = HashMap::new();
        for resource in self.availability.roster() {
            let mut entries: Vec<ScheduleEntry> = store
                .entries_for_resource(resource.id)?
                .into_iter()
                .filter(|entry| entry.status != EntryStatus::Cancelled)
                .filter(|entry| !request.ignore_entries.contains(&entry.id))
                .collect();
            entries.sort_by_key(|entry| entry.start);
            operator_schedules.insert(resource.id, entries);
        }

        // The horizon bounds fruitless scanning, not operation length: it
        // rolls forward every time a chunk lands.
        let mut horizon = earliest + Duration::days(SEARCH_HORIZON_DAYS);
        let mut cursor = earliest;
        let mut remaining = total_minutes;
        let mut chunks: Vec<ScheduleEntry> = Vec::new();
        let mut locked_machine: Option<&Machine> = None;
        let mut locked_operator: Option<u64> = None;

        while remaining > 0 {
            if let Some(deadline) = request.deadline {
                if Instant::now() >= deadline {
                    return Ok(Err(PlacementFailure::TimeoutExceeded));
                }
            }

            cursor = calendar::next_working_instant(cursor);
            if cursor >= horizon {
                debug!(
                    job_id = operation.job_id,
                    sequence = operation.sequence,
                    "search horizon exhausted"
                );
                let failure = if operators_exist {
                    PlacementFailure::CapacityExhausted
                } else {
                    PlacementFailure::NoQualifiedOperator
                };
                return Ok(Err(failure));
            }

            let (date, _, _, _) = match calendar::window_containing(cursor) {
                Some(window) => window,
                None => {
                    cursor = calendar::next_shift_boundary(cursor);
                    continue;
                }
            };

            let machines: Vec<&Machine> = match locked_machine {
                Some(machine) => vec![machine],
                None => candidates.clone(),
            };

            let preferred = self.capacity.optimal_shift();
            let shift_order = [preferred, preferred.other()];

            let mut placed = None;
            'machines: for machine in machines {
                for shift in shift_order {
                    if !machine.runs_shift(shift) {
                        continue;
                    }
                    let (window_start, window_end) = calendar::shift_window(date, shift);
                    let slot_start = window_start.max(cursor);
                    if slot_start >= window_end {
                        continue;
                    }
                    let entries = schedules
                        .get(&machine.machine_id)
                        .map(Vec::as_slice)
                        .unwrap_or(&[]);
                    for (gap_start, gap_end) in gaps_in_slot(entries, slot_start, window_end) {
                        if let Some((operator_id, start, end)) = self.fit_operator(
                            machine,
                            operation,
                            date,
                            shift,
                            gap_start,
                            gap_end,
                            locked_operator,
                            &operator_schedules,
                        ) {
                            let length = (end - start).num_minutes().min(remaining);
                            if length >= MIN_CHUNK_MINUTES {
                                placed = Some((machine, operator_id, start, length, shift));
                                break 'machines;
                            }
                        }
                    }
                }
            }

            match placed {
                Some((machine, operator_id, start, length, shift)) => {
                    let end = start + Duration::minutes(length);
                    trace!(
                        job_id = operation.job_id,
                        sequence = operation.sequence,
                        machine = %machine.machine_id,
                        operator = operator_id,
                        %start,
                        minutes = length,
                        "chunk placed"
                    );
                    chunks.push(ScheduleEntry {
                        id: 0,
                        job_id: operation.job_id,
                        sequence: operation.sequence,
                        machine_id: machine.machine_id.clone(),
                        resource_id: Some(operator_id),
                        start,
                        end,
                        shift,
                        status: EntryStatus::Scheduled,
                    });
                    if locked_machine.is_none() {
                        locked_machine = Some(machine);
                    }
                    locked_operator = Some(operator_id);
                    remaining -= length;
                    cursor = end;
                    horizon = end + Duration::days(SEARCH_HORIZON_DAYS);
                }
                None => {
                    cursor = calendar::next_shift_boundary(cursor);
                }
            }
        }

        Ok(Ok(chunks))
    }

    /// OUTSOURCE path: one entry spanning the full duration across working
    /// days, no operator, no capacity ceiling, shift 1 by convention
    fn place_outsource(
        &self,
        operation: &RoutingOperation,
        earliest: DateTime<Utc>,
        total_minutes: i64,
    ) -> PlacementResult {
        let candidates = self.resolver.candidates(operation);
        let machine = match candidates.first() {
            Some(machine) => machine,
            None => return Err(PlacementFailure::NoCandidateMachine),
        };
        let start = calendar::next_working_instant(earliest);
        let end = calendar::advance_by_working_minutes(start, total_minutes);
        Ok(vec![ScheduleEntry {
            id: 0,
            job_id: operation.job_id,
            sequence: operation.sequence,
            machine_id: machine.machine_id.clone(),
            resource_id: None,
            start,
            end,
            shift: Shift::First,
            status: EntryStatus::Scheduled,
        }])
    }

    /// Finds the operator and interval for a gap, honoring the lock
    ///
    /// Intersects the machine gap with the operator's working window, then
    /// subtracts the operator's own bookings; the first eligible operator
    /// with a free slice of at least one minute wins.
    ///
    /// Returns (operator id, slice start, slice end), or None when nobody
    /// fits.
    #[allow(clippy::too_many_arguments)]
    fn fit_operator(
        &self,
        machine: &Machine,
        operation: &RoutingOperation,
        date: chrono::NaiveDate,
        shift: Shift,
        gap_start: DateTime<Utc>,
        gap_end: DateTime<Utc>,
        locked: Option<u64>,
        operator_schedules: &HashMap<u64, Vec<ScheduleEntry>>,
    ) -> Option<(u64, DateTime<Utc>, DateTime<Utc>)> {
        let eligible = self.filter.eligible_operators(
            self.availability.roster(),
            machine,
            operation,
            locked,
        );
        for operator in eligible {
            if let Some((work_start, work_end)) =
                self.availability.working_window(operator.id, date, shift)
            {
                let start = gap_start.max(work_start);
                let end = gap_end.min(work_end);
                if start >= end {
                    continue;
                }
                let busy = operator_schedules
                    .get(&operator.id)
                    .map(Vec::as_slice)
                    .unwrap_or(&[]);
                if let Some(&(free_start, free_end)) = gaps_in_slot(busy, start, end).first() {
                    return Some((operator.id, free_start, free_end));
                }
            }
        }
        None
    }

    /// Loads a machine's blocking schedule, sorted by start
    fn machine_schedule<S: SchedulingStore + ?Sized>(
        &self,
        store: &S,
        machine_id: &str,
        ignore: &HashSet<u64>,
    ) -> Result<Vec<ScheduleEntry>> {
        let mut entries: Vec<ScheduleEntry> = store
            .entries_for_machine(machine_id)?
            .into_iter()
            .filter(|entry| entry.status != EntryStatus::Cancelled)
            .filter(|entry| !ignore.contains(&entry.id))
            .collect();
        entries.sort_by_key(|entry| entry.start);
        Ok(entries)
    }
}

/// Free gaps of at least one minute inside [slot_start, slot_end)
///
/// Each gap's end is implicitly bounded by the next blocking entry's start
/// and the window end. Entries must be sorted by start.
fn gaps_in_slot(
    entries: &[ScheduleEntry],
    slot_start: DateTime<Utc>,
    slot_end: DateTime<Utc>,
) -> Vec<(DateTime<Utc>, DateTime<Utc>)> {
    let mut gaps = Vec::new();
    let mut cursor = slot_start;
    for entry in entries {
        if entry.end <= cursor || entry.start >= slot_end {
            continue;
        }
        if entry.start > cursor {
            gaps.push((cursor, entry.start));
        }
        cursor = cursor.max(entry.end);
    }
    if cursor < slot_end {
        gaps.push((cursor, slot_end));
    }
    gaps.retain(|(start, end)| (*end - *start).num_minutes() >= MIN_CHUNK_MINUTES);
    gaps
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    use crate::application::services::calendar::BUSINESS_TZ;
    use crate::domain::entities::{Resource, ResourceRole};
    use crate::domain::value_objects::MachineType;
    use crate::infrastructure::repositories::InMemoryStore;

    fn local(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
        BUSINESS_TZ
            .with_ymd_and_hms(y, m, d, h, min, 0)
            .unwrap()
            .with_timezone(&Utc)
    }

    fn operator_on(id: u64, name: &str, machine_id: &str, shifts: Vec<Shift>) -> Resource {
        let mut resource = Resource::new(id, name, ResourceRole::Operator, shifts);
        resource.work_centers = vec![machine_id.to_string()];
        resource
    }

    struct World {
        store: InMemoryStore,
        machines: Vec<Machine>,
    }

    impl World {
        fn new(machines: Vec<Machine>, roster: Vec<Resource>) -> Self {
            let mut store = InMemoryStore::new();
            for machine in &machines {
                store.insert_machine(machine.clone()).unwrap();
            }
            for resource in roster {
                store.insert_resource(resource).unwrap();
            }
            Self { store, machines }
        }

        fn place(&self, operation: &RoutingOperation, now: DateTime<Utc>) -> PlacementResult {
            let resolver = SubstitutionResolver::new(self.machines.clone());
            let availability = AvailabilityService::snapshot(
                &self.store,
                calendar::local_date(now),
                calendar::local_date(now) + Duration::days(40),
            )
            .unwrap();
            let capacity = ShiftCapacityService::for_week(&self.store, now).unwrap();
            let engine = PlacementEngine::new(&resolver, &availability, &capacity);
            let ignore = HashSet::new();
            engine
                .place(
                    &self.store,
                    &PlacementRequest {
                        operation,
                        search_from: now,
                        now,
                        deadline: None,
                        ignore_entries: &ignore,
                    },
                )
                .unwrap()
        }
    }

    #[test]
    fn test_single_shift_production_chunk() {
        // Monday 10:00 request, 4h MILL: lands Tuesday 03:00-07:00 shift 1
        let world = World::new(
            vec![Machine::new(1, "MILL-01", MachineType::Mill)],
            vec![operator_on(1, "Alice", "MILL-01", vec![Shift::First])],
        );
        let op = RoutingOperation::new(1, 1, "Mill", MachineType::Mill, 4.0, 0.0);
        let chunks = world.place(&op, local(2025, 6, 2, 10, 0)).unwrap();

        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].start, local(2025, 6, 3, 3, 0));
        assert_eq!(chunks[0].end, local(2025, 6, 3, 7, 0));
        assert_eq!(chunks[0].shift, Shift::First);
        assert_eq!(chunks[0].resource_id, Some(1));
    }

    #[test]
    fn test_multi_day_bridge_locks_machine_and_operator() {
        // 25.5h on a shift-1-only machine: 12h Tue + 12h Wed + 1.5h Thu
        let mut hmc = Machine::new(1, "HMC-05", MachineType::Mill);
        hmc.available_shifts = vec![Shift::First];
        let world = World::new(
            vec![hmc],
            vec![operator_on(1, "Drew", "HMC-05", vec![Shift::First])],
        );
        let op = RoutingOperation::new(1, 1, "Mill", MachineType::Mill, 25.5, 0.0);
        let chunks = world.place(&op, local(2025, 6, 2, 10, 0)).unwrap();

        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0].start, local(2025, 6, 3, 3, 0));
        assert_eq!(chunks[0].end, local(2025, 6, 3, 15, 0));
        assert_eq!(chunks[1].start, local(2025, 6, 4, 3, 0));
        assert_eq!(chunks[1].end, local(2025, 6, 4, 15, 0));
        assert_eq!(chunks[2].start, local(2025, 6, 5, 3, 0));
        assert_eq!(chunks[2].end, local(2025, 6, 5, 4, 30));
        for chunk in &chunks {
            assert_eq!(chunk.machine_id, "HMC-05");
            assert_eq!(chunk.resource_id, Some(1));
        }
        let total: i64 = chunks.iter().map(|c| c.duration_minutes()).sum();
        assert_eq!(total, 1530);
    }

    #[test]
    fn test_weekend_skip() {
        // Thursday 11:00 request floors to Monday (never today, Fri-Sun off)
        let world = World::new(
            vec![Machine::new(1, "LATHE-02", MachineType::Lathe)],
            vec![operator_on(1, "Pat", "LATHE-02", vec![Shift::First])],
        );
        let op = RoutingOperation::new(1, 1, "Turn", MachineType::Lathe, 6.0, 0.0);
        let chunks = world.place(&op, local(2025, 6, 5, 11, 0)).unwrap();

        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].start, local(2025, 6, 9, 3, 0));
        assert_eq!(chunks[0].end, local(2025, 6, 9, 9, 0));
    }

    #[test]
    fn test_gap_after_existing_entry() {
        // Machine busy Tue 03:00-07:00: a 4h op lands 07:00-11:00 with the
        // same-shift gap reused
        let world = World::new(
            vec![Machine::new(1, "MILL-01", MachineType::Mill)],
            vec![
                operator_on(1, "Alice", "MILL-01", vec![Shift::First]),
            ],
        );
        let blocker = ScheduleEntry {
            id: 0,
            job_id: 99,
            sequence: 1,
            machine_id: "MILL-01".to_string(),
            resource_id: Some(1),
            start: local(2025, 6, 3, 3, 0),
            end: local(2025, 6, 3, 7, 0),
            shift: Shift::First,
            status: EntryStatus::Scheduled,
        };
        let mut world = world;
        world.store.append_entries(vec![blocker]).unwrap();

        let op = RoutingOperation::new(1, 1, "Mill", MachineType::Mill, 4.0, 0.0);
        let chunks = world.place(&op, local(2025, 6, 2, 10, 0)).unwrap();
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].start, local(2025, 6, 3, 7, 0));
        assert_eq!(chunks[0].end, local(2025, 6, 3, 11, 0));
    }

    #[test]
    fn test_outsource_single_entry_no_operator() {
        let world = World::new(
            vec![Machine::new(1, "OUTSOURCE-01", MachineType::Outsource)],
            vec![],
        );
        let op = RoutingOperation::new(1, 1, "Plate", MachineType::Outsource, 40.0, 0.0);
        let chunks = world.place(&op, local(2025, 6, 2, 10, 0)).unwrap();

        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].resource_id, None);
        assert_eq!(chunks[0].shift, Shift::First);
        assert_eq!(chunks[0].start, local(2025, 6, 3, 3, 0));
        // 40 working hours from Tue 03:00: 24h through Wed 03:00, 16 more
        // land Wed 19:00
        assert_eq!(chunks[0].end, local(2025, 6, 4, 19, 0));
    }

    #[test]
    fn test_no_candidate_machine() {
        let world = World::new(
            vec![Machine::new(1, "MILL-01", MachineType::Mill)],
            vec![operator_on(1, "Alice", "MILL-01", vec![Shift::First])],
        );
        let op = RoutingOperation::new(1, 1, "Turn", MachineType::Lathe, 2.0, 0.0);
        let failure = world.place(&op, local(2025, 6, 2, 10, 0)).unwrap_err();
        assert_eq!(failure, PlacementFailure::NoCandidateMachine);
    }

    #[test]
    fn test_no_qualified_operator() {
        // A machine exists but nobody is qualified on it
        let world = World::new(
            vec![Machine::new(1, "MILL-01", MachineType::Mill)],
            vec![operator_on(1, "Alice", "LATHE-02", vec![Shift::First])],
        );
        let op = RoutingOperation::new(1, 1, "Mill", MachineType::Mill, 2.0, 0.0);
        let failure = world.place(&op, local(2025, 6, 2, 10, 0)).unwrap_err();
        assert_eq!(failure, PlacementFailure::NoQualifiedOperator);
    }

    #[test]
    fn test_capacity_exhausted_when_operator_never_free() {
        // Operator exists and is qualified but on vacation for the whole
        // 30-day horizon
        let mut store_world = World::new(
            vec![Machine::new(1, "MILL-01", MachineType::Mill)],
            vec![operator_on(1, "Alice", "MILL-01", vec![Shift::First])],
        );
        let vacation = crate::domain::entities::ResourceUnavailability::full_day(
            1,
            vec![1],
            chrono::NaiveDate::from_ymd_opt(2025, 6, 1).unwrap(),
            chrono::NaiveDate::from_ymd_opt(2025, 8, 1).unwrap(),
            "vacation",
        );
        store_world.store.insert_unavailability(vacation).unwrap();

        let op = RoutingOperation::new(1, 1, "Mill", MachineType::Mill, 2.0, 0.0);
        let failure = store_world.place(&op, local(2025, 6, 2, 10, 0)).unwrap_err();
        assert_eq!(failure, PlacementFailure::CapacityExhausted);
    }

    #[test]
    fn test_chunk_may_end_exactly_on_shift_boundary() {
        // 12h operation fills Shift 1 exactly
        let world = World::new(
            vec![Machine::new(1, "MILL-01", MachineType::Mill)],
            vec![operator_on(1, "Alice", "MILL-01", vec![Shift::First])],
        );
        let op = RoutingOperation::new(1, 1, "Mill", MachineType::Mill, 12.0, 0.0);
        let chunks = world.place(&op, local(2025, 6, 2, 10, 0)).unwrap();
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].end, local(2025, 6, 3, 15, 0));
    }

    #[test]
    fn test_night_shift_chunk_crosses_midnight() {
        // Operator and machine on shift 2 only: the chunk runs 15:00-01:00
        // as a single entry belonging to Tuesday's shift 2
        let mut machine = Machine::new(1, "MILL-01", MachineType::Mill);
        machine.available_shifts = vec![Shift::Second];
        let world = World::new(
            vec![machine],
            vec![operator_on(1, "Noor", "MILL-01", vec![Shift::Second])],
        );
        let op = RoutingOperation::new(1, 1, "Mill", MachineType::Mill, 10.0, 0.0);
        let chunks = world.place(&op, local(2025, 6, 2, 10, 0)).unwrap();

        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].shift, Shift::Second);
        assert_eq!(chunks[0].start, local(2025, 6, 3, 15, 0));
        assert_eq!(chunks[0].end, local(2025, 6, 4, 1, 0));
    }

    #[test]
    fn test_setup_hours_add_to_duration() {
        let world = World::new(
            vec![Machine::new(1, "MILL-01", MachineType::Mill)],
            vec![operator_on(1, "Alice", "MILL-01", vec![Shift::First])],
        );
        let op = RoutingOperation::new(1, 1, "Mill", MachineType::Mill, 3.5, 0.5);
        let chunks = world.place(&op, local(2025, 6, 2, 10, 0)).unwrap();
        let total: i64 = chunks.iter().map(|c| c.duration_minutes()).sum();
        assert_eq!(total, 240);
    }
}
