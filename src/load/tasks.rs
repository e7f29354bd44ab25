use rand::Rng;
use rand::distributions::{Distribution, WeightedIndex};

use crate::args::LoadArgs;
use crate::error::{AppError, AppResult, ValidationError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RaffleTask {
    PurchaseTicket,
    CheckRaffleStatus,
    CancelRaffle,
}

impl RaffleTask {
    pub const ALL: [Self; 3] = [
        Self::PurchaseTicket,
        Self::CheckRaffleStatus,
        Self::CancelRaffle,
    ];

    /// Stats name; the status route is grouped under its path template.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::PurchaseTicket => "/api/purchase-ticket",
            Self::CheckRaffleStatus => "/api/raffle-status/:raffleId",
            Self::CancelRaffle => "/api/cancel-raffle",
        }
    }

    #[must_use]
    pub const fn request_type(self) -> &'static str {
        match self {
            Self::PurchaseTicket | Self::CancelRaffle => "POST",
            Self::CheckRaffleStatus => "GET",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaskWeights {
    pub purchase: u32,
    pub status: u32,
    pub cancel: u32,
}

impl Default for TaskWeights {
    fn default() -> Self {
        Self {
            purchase: 1,
            status: 2,
            cancel: 1,
        }
    }
}

impl TaskWeights {
    #[must_use]
    pub const fn from_args(args: &LoadArgs) -> Self {
        Self {
            purchase: args.weight_purchase,
            status: args.weight_status,
            cancel: args.weight_cancel,
        }
    }

    /// Widened so the sum of three `u32` weights cannot overflow.
    fn as_array(self) -> [u64; 3] {
        [
            u64::from(self.purchase),
            u64::from(self.status),
            u64::from(self.cancel),
        ]
    }
}

/// Weighted random choice among [`RaffleTask::ALL`].
#[derive(Debug, Clone)]
pub struct TaskPicker {
    distribution: WeightedIndex<u64>,
}

impl TaskPicker {
    /// # Errors
    ///
    /// Returns an error when every weight is zero.
    pub fn new(weights: TaskWeights) -> AppResult<Self> {
        let distribution = WeightedIndex::new(weights.as_array())
            .map_err(|_err| AppError::validation(ValidationError::AllWeightsZero))?;
        Ok(Self { distribution })
    }

    pub fn pick<R: Rng + ?Sized>(&self, rng: &mut R) -> RaffleTask {
        RaffleTask::ALL
            .get(self.distribution.sample(rng))
            .copied()
            .unwrap_or(RaffleTask::CheckRaffleStatus)
    }
}
