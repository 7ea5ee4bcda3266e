//! Channel plumbing connecting the row-band workers.

use std::collections::{BTreeMap, HashMap};

use gridrelax_concepts::IndexError;

use crate::backend::RelaxError;

/// Validates a given neighbour map.
///
/// This algorithm checks if every keys neighbours also contain the specified
/// key. If this is not the case, the map cannot be considered valid. Note
/// that this algorithm does not check if all keys are connected. This means,
/// disjoint sets are allowed.
///
/// ```
/// use gridrelax_core::backend::banded::validate_map;
///
/// let new_map = std::collections::HashMap::from([
///     (0_usize, vec![1]),
///     (1_usize, vec![0, 2]),
///     (2_usize, vec![1]),
/// ]);
///
/// assert!(validate_map(&new_map));
/// ```
pub fn validate_map<I>(map: &HashMap<I, Vec<I>>) -> bool
where
    I: Eq + core::hash::Hash + Clone + Ord,
{
    for (index, neighbours) in map.iter() {
        if neighbours.iter().any(|n| match map.get(n) {
            Some(reverse_neighbours) => !reverse_neighbours.contains(index),
            None => true,
        }) {
            return false;
        }
    }
    true
}

/// Neighbour map of a one-dimensional chain of row bands: every rank is
/// connected to the rank directly above and below it.
///
/// ```
/// use gridrelax_core::backend::banded::{band_neighbour_map, validate_map};
///
/// let map = band_neighbour_map(3);
/// assert_eq!(map[&1], vec![0, 2]);
/// assert!(validate_map(&map));
/// ```
pub fn band_neighbour_map(n_ranks: usize) -> HashMap<usize, Vec<usize>> {
    (0..n_ranks)
        .map(|rank| {
            let mut neighbours = Vec::new();
            if rank > 0 {
                neighbours.push(rank - 1);
            }
            if rank + 1 < n_ranks {
                neighbours.push(rank + 1);
            }
            (rank, neighbours)
        })
        .collect()
}

/// Constructs a collection of items from a neighbour map.
pub trait FromMap<I>
where
    Self: Sized,
{
    /// Creates one item per map key, wired up to the items of the key's
    /// neighbours.
    fn from_map(map: &HashMap<I, Vec<I>>) -> Result<HashMap<I, Self>, IndexError>
    where
        I: Eq + core::hash::Hash + Clone + Ord;
}

/// Sender-Receiver communicator based on [crossbeam_channel].
///
/// This struct contains one receiver and one sender per connected neighbour.
/// It can be constructed by using the [FromMap] trait. Sends never block
/// since the underlying channels are unbounded; receives block until a
/// message arrives or every connected sender is gone.
///
/// ```
/// # use gridrelax_core::backend::banded::{ChannelComm, FromMap};
/// # use std::collections::HashMap;
/// let map = HashMap::from([
///     (0, vec![1]),
///     (1, vec![0]),
/// ]);
/// let mut comms = ChannelComm::from_map(&map).unwrap();
/// let mut comm_0 = comms.remove(&0).unwrap();
/// let mut comm_1 = comms.remove(&1).unwrap();
///
/// comm_0.send(&1, 42_i32).unwrap();
/// assert_eq!(comm_1.receive_blocking().unwrap(), 42);
/// ```
pub struct ChannelComm<I, T> {
    /// One sender per connected neighbour.
    senders: BTreeMap<I, crossbeam_channel::Sender<T>>,
    /// Receiving end shared by all senders pointing at this index.
    receiver: crossbeam_channel::Receiver<T>,
}

impl<T, I> FromMap<I> for ChannelComm<I, T>
where
    I: Ord,
{
    fn from_map(map: &HashMap<I, Vec<I>>) -> Result<HashMap<I, Self>, IndexError>
    where
        I: Clone + core::hash::Hash + Eq,
    {
        let channels: HashMap<_, _> = map
            .keys()
            .map(|key| {
                let (s, r) = crossbeam_channel::unbounded::<T>();
                (key, (s, r))
            })
            .collect();
        let mut comms = HashMap::new();
        for key in map.keys() {
            let senders = map
                .get(key)
                .ok_or(IndexError(
                    "Network of communicators could not be constructed due to incorrect entries in map"
                        .into(),
                ))?
                .iter()
                .map(|connected_key| (connected_key.clone(), channels[connected_key].0.clone()))
                .collect();
            let comm = ChannelComm {
                senders,
                receiver: channels[key].1.clone(),
            };
            comms.insert(key.clone(), comm);
        }
        Ok(comms)
    }
}

impl<I, T> ChannelComm<I, T>
where
    I: Ord + Clone,
{
    /// Indices of all connected neighbours.
    pub fn connections(&self) -> Vec<I> {
        self.senders.keys().cloned().collect()
    }

    /// Sends a message to the given neighbour without blocking.
    pub fn send(&mut self, receiver: &I, message: T) -> Result<(), RelaxError> {
        self.senders
            .get(receiver)
            .ok_or(IndexError(
                "tried to send to an index which is not a connected neighbour".into(),
            ))?
            .send(message)?;
        Ok(())
    }

    /// Blocks until the next message from any neighbour arrives.
    pub fn receive_blocking(&mut self) -> Result<T, RelaxError> {
        Ok(self.receiver.recv()?)
    }
}
