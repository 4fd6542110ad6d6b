//! Memes: coordination payloads carried by statements.
//!
//! A meme is interpreted once per living teammate when its statement
//! finishes. Each interpretation re-checks its precondition against the
//! receiver's own view of the world; stale memes are ignored, never retried.

use std::fmt;

use tracing::trace;

use super::phrase::names;
use super::statement::{ContextPart, Plan, Statement, Topic};
use crate::blackboard::{Blackboard, HelpRequest, Noise, TeammatePlan};
use crate::types::{EntityId, GameTime, Location, PlaceId};
use crate::world::World;

/// Relayed noises kept on a blackboard.
pub const MAX_NOISES: usize = 8;
/// Teammates farther than this from the sender ignore "follow me".
pub const FOLLOW_RANGE: f32 = 1500.0;

/// The receiving side of a meme broadcast.
pub struct MemeReceiver<'a> {
    /// The teammate receiving the meme.
    pub me: EntityId,
    /// Current time.
    pub now: GameTime,
    /// World collaborators, seen from the receiver.
    pub world: &'a dyn World,
    /// The receiver's private knowledge.
    pub blackboard: &'a mut Blackboard,
    /// Replies the receiver wants to queue.
    pub replies: &'a mut Vec<Statement>,
}

impl MemeReceiver<'_> {
    /// Queue a reply from the receiver.
    pub fn reply(&mut self, statement: Statement) {
        self.replies.push(statement);
    }

    fn is_alive(&self, id: EntityId) -> bool {
        self.world.actor(id).is_some_and(|a| a.alive)
    }
}

impl fmt::Debug for MemeReceiver<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemeReceiver")
            .field("me", &self.me)
            .field("now", &self.now)
            .field("replies", &self.replies.len())
            .finish_non_exhaustive()
    }
}

/// A cross-actor coordination payload.
pub trait Meme: fmt::Debug {
    /// Short name for logs.
    fn name(&self) -> &'static str;

    /// Apply to one receiver. Read-only with respect to the sender.
    fn interpret(&self, sender: EntityId, receiver: &mut MemeReceiver<'_>);
}

/// "I need help at this place."
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RequestHelp {
    /// Where the sender is fighting.
    pub place: Option<PlaceId>,
}

impl Meme for RequestHelp {
    fn name(&self) -> &'static str {
        "request_help"
    }

    fn interpret(&self, sender: EntityId, receiver: &mut MemeReceiver<'_>) {
        if !receiver.is_alive(sender) {
            trace!(meme = self.name(), "Sender died; ignoring");
            return;
        }
        receiver.blackboard.help_request = Some(HelpRequest {
            from: sender,
            place: self.place,
            received_at: receiver.now,
        });
    }
}

/// "The objective item is loose here."
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlagLoose {
    /// Where it was seen.
    pub position: Location,
}

impl Meme for FlagLoose {
    fn name(&self) -> &'static str {
        "flag_loose"
    }

    fn interpret(&self, _sender: EntityId, receiver: &mut MemeReceiver<'_>) {
        let still_loose = receiver
            .world
            .actor(receiver.me)
            .and_then(|me| receiver.world.flag(me.team))
            .is_some_and(|flag| flag.is_loose());
        if still_loose {
            receiver.blackboard.loose_flag = Some(self.position);
        } else {
            receiver.blackboard.loose_flag = None;
        }
    }
}

/// "Follow me."
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FollowRequest;

impl Meme for FollowRequest {
    fn name(&self) -> &'static str {
        "follow_request"
    }

    fn interpret(&self, sender: EntityId, receiver: &mut MemeReceiver<'_>) {
        if !receiver.is_alive(sender) || receiver.blackboard.follow_request == Some(sender) {
            return;
        }
        let (Some(me), Some(leader)) = (receiver.world.actor(receiver.me), receiver.world.actor(sender))
        else {
            return;
        };
        if me.squad.is_some() || me.position.distance(&leader.position) > FOLLOW_RANGE {
            trace!(meme = self.name(), "Already in a squad or out of reach");
            return;
        }
        receiver.blackboard.follow_request = Some(sender);
        let reply = Statement::new(receiver.me, Topic::Affirmative, receiver.now)
            .about(sender)
            .phrase(names::AFFIRMATIVE);
        receiver.reply(reply);
    }
}

/// "Defend this place."
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DefendHereRequest {
    /// Place to hold.
    pub place: PlaceId,
}

impl Meme for DefendHereRequest {
    fn name(&self) -> &'static str {
        "defend_here_request"
    }

    fn interpret(&self, _sender: EntityId, receiver: &mut MemeReceiver<'_>) {
        let Some(me) = receiver.world.actor(receiver.me) else {
            return;
        };
        let held = receiver
            .world
            .control_points()
            .iter()
            .any(|p| p.place == Some(self.place) && p.is_owned_by(me.team));
        if me.carrying_flag || !held {
            trace!(meme = self.name(), place = %self.place, "Nothing to hold there");
            return;
        }
        receiver.blackboard.defend_request = Some(self.place);
    }
}

/// "Everyone report in."
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ReportRequest;

impl Meme for ReportRequest {
    fn name(&self) -> &'static str {
        "report_request"
    }

    fn interpret(&self, _sender: EntityId, receiver: &mut MemeReceiver<'_>) {
        if !receiver.is_alive(receiver.me) {
            return;
        }
        receiver.blackboard.report_requested = true;
        let place = receiver.world.actor(receiver.me).and_then(|me| me.place);
        let reply = Statement::new(receiver.me, Topic::ReportingIn, receiver.now)
            .at_place(place)
            .phrase(names::REPORTING_IN)
            .context(ContextPart::CurrentPlace);
        receiver.reply(reply);
    }
}

/// "Enemy sniper at this place."
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SniperWarning {
    /// Where the sniper is.
    pub place: PlaceId,
}

impl Meme for SniperWarning {
    fn name(&self) -> &'static str {
        "sniper_warning"
    }

    fn interpret(&self, _sender: EntityId, receiver: &mut MemeReceiver<'_>) {
        if !receiver.blackboard.sniper_warnings.contains(&self.place) {
            receiver.blackboard.sniper_warnings.push(self.place);
        }
    }
}

/// "I heard something over there."
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NoiseHeard {
    /// Where the noise came from.
    pub position: Location,
}

impl Meme for NoiseHeard {
    fn name(&self) -> &'static str {
        "noise_heard"
    }

    fn interpret(&self, _sender: EntityId, receiver: &mut MemeReceiver<'_>) {
        let noises = &mut receiver.blackboard.noises;
        if noises.len() >= MAX_NOISES {
            noises.remove(0);
        }
        noises.push(Noise {
            position: self.position,
            heard_at: receiver.now,
        });
    }
}

/// "My plan is P at L."
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlanAnnouncement {
    /// The plan.
    pub plan: Plan,
    /// Where.
    pub place: Option<PlaceId>,
}

impl Meme for PlanAnnouncement {
    fn name(&self) -> &'static str {
        "plan_announcement"
    }

    fn interpret(&self, sender: EntityId, receiver: &mut MemeReceiver<'_>) {
        if !receiver.is_alive(sender) {
            return;
        }
        receiver.blackboard.teammate_plans.insert(
            sender,
            TeammatePlan {
                plan: self.plan,
                place: self.place,
            },
        );
    }
}
