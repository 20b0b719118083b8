use rand::Rng;
use rand::seq::IndexedRandom;

use raffle_common::identity::Identity;

/// Picks one participant uniformly at random. `None` for an empty slice.
pub fn pick_winner<'a, R>(participants: &'a [Identity], rng: &mut R) -> Option<&'a Identity>
where
    R: Rng + ?Sized,
{
    participants.choose(rng)
}
