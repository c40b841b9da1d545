//! Coupling-aware chunk planning.

use std::collections::{BTreeMap, VecDeque};
use std::fmt;
use std::iter::FusedIterator;

use crate::coupling::CouplingRules;
use crate::setting::{Setting, find_duplicate};

use super::{Chunk, PlanError};

/// How coupled groups share chunks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CoupledPacking {
    /// Every coupled group gets a chunk of its own; free settings start
    /// a fresh chunk after the last group.
    #[default]
    Isolated,
    /// Coupled groups are packed into chunks up to the size bound, and free
    /// settings top up every partly used coupled chunk before new chunks
    /// start.
    Fill,
}

impl fmt::Display for CoupledPacking {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Isolated => write!(f, "isolated"),
            Self::Fill => write!(f, "fill"),
        }
    }
}

/// Order in which free (uncoupled) settings are packed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FreeOrder {
    /// Presentation order; apply timing plays no part.
    #[default]
    Input,
    /// Immediate settings first, then pending-reboot settings, each
    /// keeping presentation order.
    ImmediateFirst,
}

impl fmt::Display for FreeOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Input => write!(f, "input"),
            Self::ImmediateFirst => write!(f, "immediate-first"),
        }
    }
}

/// Tunables for the planner.
///
/// # Defaults
///
/// - `max_chunk_size`: 20
/// - `coupled_packing`: [`CoupledPacking::Isolated`]
/// - `free_order`: [`FreeOrder::Input`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlannerPolicy {
    /// Maximum number of settings per chunk. Zero is rejected at plan time.
    pub max_chunk_size: usize,
    /// How coupled groups share chunks.
    pub coupled_packing: CoupledPacking,
    /// Order of free settings.
    pub free_order: FreeOrder,
}

impl PlannerPolicy {
    /// Default maximum settings per call.
    pub const DEFAULT_MAX_CHUNK_SIZE: usize = 20;

    /// Creates a policy with default values.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            max_chunk_size: Self::DEFAULT_MAX_CHUNK_SIZE,
            coupled_packing: CoupledPacking::Isolated,
            free_order: FreeOrder::Input,
        }
    }

    /// Sets the maximum chunk size.
    #[must_use]
    pub const fn with_max_chunk_size(mut self, size: usize) -> Self {
        self.max_chunk_size = size;
        self
    }

    /// Sets the coupled packing mode.
    #[must_use]
    pub const fn with_coupled_packing(mut self, packing: CoupledPacking) -> Self {
        self.coupled_packing = packing;
        self
    }

    /// Sets the free-setting order.
    #[must_use]
    pub const fn with_free_order(mut self, order: FreeOrder) -> Self {
        self.free_order = order;
        self
    }
}

impl Default for PlannerPolicy {
    fn default() -> Self {
        Self::new()
    }
}

/// Partitions settings into chunks according to a policy and coupling rules.
///
/// # Example
///
/// ```
/// use paramsync::coupling::CouplingTable;
/// use paramsync::plan::{Planner, PlannerPolicy};
/// use paramsync::setting::Setting;
///
/// let planner = Planner::new(
///     PlannerPolicy::new().with_max_chunk_size(3),
///     CouplingTable::builtin().rules_for("mysql8.0"),
/// );
///
/// let chunks: Vec<_> = planner
///     .plan(vec![
///         Setting::new("tx_isolation", "repeatable-read"),
///         Setting::new("collation_server", "utf8_unicode_ci"),
///         Setting::new("character_set_server", "utf8"),
///     ])
///     .unwrap()
///     .collect();
///
/// assert_eq!(chunks.len(), 2);
/// assert_eq!(chunks[0].settings()[0].name.as_str(), "character_set_server");
/// ```
#[derive(Debug, Clone)]
pub struct Planner {
    policy: PlannerPolicy,
    rules: CouplingRules,
}

impl Planner {
    /// Creates a planner.
    #[must_use]
    pub const fn new(policy: PlannerPolicy, rules: CouplingRules) -> Self {
        Self { policy, rules }
    }

    /// Returns the policy.
    #[must_use]
    pub const fn policy(&self) -> &PlannerPolicy {
        &self.policy
    }

    /// Returns the coupling rules.
    #[must_use]
    pub const fn rules(&self) -> &CouplingRules {
        &self.rules
    }

    /// Plans chunks for `settings`.
    ///
    /// # Errors
    ///
    /// Returns [`PlanError::ZeroChunkSize`] if the policy's bound is zero and
    /// [`PlanError::DuplicateSetting`] if a name repeats (ignoring case).
    pub fn plan(&self, settings: Vec<Setting>) -> Result<Chunks, PlanError> {
        let max = self.policy.max_chunk_size;
        if max == 0 {
            return Err(PlanError::ZeroChunkSize);
        }
        if let Some(name) = find_duplicate(&settings) {
            return Err(PlanError::DuplicateSetting { name: name.clone() });
        }

        let (groups, free) = self.partition(settings);
        let group_lens: Vec<usize> = groups.iter().map(Vec::len).collect();
        let slots = match self.policy.coupled_packing {
            CoupledPacking::Isolated => layout_isolated(&group_lens, free.len(), max),
            CoupledPacking::Fill => layout_fill(&group_lens, free.len(), max),
        };

        tracing::debug!(
            "Planned {} chunk(s): {} coupled group(s), {} free setting(s), max {} per chunk",
            slots.len(),
            groups.len(),
            free.len(),
            max
        );

        Ok(Chunks {
            groups: groups.into(),
            free: free.into(),
            slots: slots.into(),
        })
    }

    /// Splits settings into ordered coupled groups and ordered free settings.
    fn partition(&self, settings: Vec<Setting>) -> (Vec<Vec<Setting>>, Vec<Setting>) {
        let tagged: Vec<(Option<usize>, Setting)> = settings
            .into_iter()
            .map(|s| (self.rules.group_of(&s.name), s))
            .collect();

        let mut present: BTreeMap<usize, usize> = BTreeMap::new();
        for (group, _) in &tagged {
            if let Some(g) = group {
                *present.entry(*g).or_default() += 1;
            }
        }

        let mut coupled: BTreeMap<usize, Vec<Setting>> = BTreeMap::new();
        let mut free = Vec::new();
        for (group, setting) in tagged {
            // Coupling only binds when two or more members change together
            match group.filter(|g| present[g] > 1) {
                Some(g) => coupled.entry(g).or_default().push(setting),
                None => free.push(setting),
            }
        }

        let mut groups: Vec<Vec<Setting>> = coupled.into_values().collect();
        for group in &mut groups {
            group.sort_by(|a, b| a.name.cmp(&b.name));
        }
        groups.sort_by(|a, b| a[0].name.cmp(&b[0].name));

        if self.policy.free_order == FreeOrder::ImmediateFirst {
            let (mut immediate, pending): (Vec<_>, Vec<_>) =
                free.into_iter().partition(|s| !s.requires_restart());
            immediate.extend(pending);
            free = immediate;
        }

        (groups, free)
    }
}

/// Plans `settings` into chunks of at most `max_chunk_size` with default
/// packing and ordering.
///
/// # Errors
///
/// See [`Planner::plan`].
pub fn plan(
    settings: Vec<Setting>,
    max_chunk_size: usize,
    rules: &CouplingRules,
) -> Result<Chunks, PlanError> {
    Planner::new(
        PlannerPolicy::new().with_max_chunk_size(max_chunk_size),
        rules.clone(),
    )
    .plan(settings)
}

/// Shape of one output chunk: how many coupled groups and free settings it
/// takes from the front of the queues.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Slot {
    groups: usize,
    free: usize,
    oversized: bool,
}

fn free_slots(slots: &mut Vec<Slot>, mut remaining: usize, max: usize) {
    while remaining > 0 {
        let take = remaining.min(max);
        slots.push(Slot {
            groups: 0,
            free: take,
            oversized: false,
        });
        remaining -= take;
    }
}

fn layout_isolated(group_lens: &[usize], free_len: usize, max: usize) -> Vec<Slot> {
    let mut slots: Vec<Slot> = group_lens
        .iter()
        .map(|&len| Slot {
            groups: 1,
            free: 0,
            oversized: len > max,
        })
        .collect();
    free_slots(&mut slots, free_len, max);
    slots
}

fn layout_fill(group_lens: &[usize], free_len: usize, max: usize) -> Vec<Slot> {
    let mut slots = Vec::new();
    // settings used so far in each slot
    let mut used = Vec::new();
    let mut open: Option<usize> = None;

    for &len in group_lens {
        if len > max {
            open = None;
            slots.push(Slot {
                groups: 1,
                free: 0,
                oversized: true,
            });
            used.push(len);
            continue;
        }
        match open {
            Some(i) if used[i] + len <= max => {
                slots[i].groups += 1;
                used[i] += len;
            }
            _ => {
                open = Some(slots.len());
                slots.push(Slot {
                    groups: 1,
                    free: 0,
                    oversized: false,
                });
                used.push(len);
            }
        }
    }

    let mut remaining = free_len;
    for (slot, used) in slots.iter_mut().zip(used) {
        if remaining == 0 {
            break;
        }
        if slot.oversized {
            continue;
        }
        slot.free = (max - used).min(remaining);
        remaining -= slot.free;
    }
    free_slots(&mut slots, remaining, max);
    slots
}

/// Lazy sequence of planned chunks.
///
/// The chunk layout is fixed when planning succeeds; settings are moved
/// into each [`Chunk`] only as it is yielded. The exact number of remaining
/// chunks is available through [`ExactSizeIterator::len`].
#[derive(Debug)]
pub struct Chunks {
    groups: VecDeque<Vec<Setting>>,
    free: VecDeque<Setting>,
    slots: VecDeque<Slot>,
}

impl Chunks {
    /// A sequence with no chunks.
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            groups: VecDeque::new(),
            free: VecDeque::new(),
            slots: VecDeque::new(),
        }
    }
}

impl Iterator for Chunks {
    type Item = Chunk;

    fn next(&mut self) -> Option<Chunk> {
        let slot = self.slots.pop_front()?;
        let mut settings = Vec::new();
        for _ in 0..slot.groups {
            settings.extend(self.groups.pop_front().unwrap_or_default());
        }
        let take = slot.free.min(self.free.len());
        settings.extend(self.free.drain(..take));

        Some(if slot.oversized {
            Chunk::oversized(settings)
        } else {
            Chunk::new(settings)
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.slots.len(), Some(self.slots.len()))
    }
}

impl ExactSizeIterator for Chunks {}

impl FusedIterator for Chunks {}
