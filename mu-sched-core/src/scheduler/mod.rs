//! Multi-user scheduler: picks the format of every transmit opportunity.
//!
//! # Decision order
//!
//! 1. Sensing enabled and a CF-Poll at the head of the primary queue:
//!    run the sensing step (poll round or sounding announcement).
//! 2. Head frame addressed to a station without MU support: SU.
//! 3. UL MU enabled with BSRP, after a DL MU PPDU or with nothing queued:
//!    try a BSRP trigger.
//! 4. Otherwise UL MU enabled, after a DL MU PPDU, after a BSRP trigger
//!    or with nothing queued: try a Basic trigger.
//! 5. A trigger with nobody to solicit falls through to DL MU.
//! 6. Fewer stations than `min_dl_mu_stations` in the primary list: SU.
//! 7. Otherwise try a DL MU PPDU.
//!
//! Each decision is remembered. The matching `compute_*_info` call then
//! finalizes the PPDU, settles the fairness ledger and hands out the
//! result; it returns `None` when the last decision was of another kind.

mod allocation;
mod downlink;
mod fairness;
mod registry;
mod report;
mod sensing;
mod stats;
mod types;
mod uplink;

pub use fairness::FairnessLedger;
pub use registry::{StationEntry, StationList, StationRegistry};
pub use report::{angle_count, report_length, subcarrier_count, FeedbackType};
pub use stats::SchedulerStats;
pub use types::{
    AccessPoint, Candidate, DlInfo, PollInfo, SoundingScope, SoundingTarget, TxFormat,
    TxOpportunity, UlInfo,
};

use tracing::{debug, info, warn};

use crate::config::{SchedulerConfig, SoundingMode};
use crate::env::MacEnv;
use crate::errors::SchedError;
use crate::mac::{Aid, MacAddress, QueuedFrame, TriggerKind};

use downlink::{DownlinkBuild, DownlinkOutcome};
use sensing::{PollBuild, SensingState};
use uplink::{UplinkBuild, UplinkOutcome};

/// The PPDU chosen by the last decision, awaiting finalization.
#[derive(Debug, Clone, Default)]
enum Pending {
    #[default]
    None,
    Downlink(DownlinkBuild),
    Uplink(UplinkBuild),
    Poll(PollBuild),
}

#[derive(Debug, Clone)]
pub struct MuScheduler {
    config: SchedulerConfig,
    ap: AccessPoint,
    ledger: FairnessLedger,
    registry: StationRegistry,
    last_format: Option<TxFormat>,
    last_trigger: Option<TriggerKind>,
    opportunity: Option<TxOpportunity>,
    pending: Pending,
    sensing: SensingState,
    stats: SchedulerStats,
}

impl MuScheduler {
    pub fn new(config: SchedulerConfig, ap: AccessPoint) -> Result<Self, SchedError> {
        config.validate()?;
        if ap.antennas == 0 {
            return Err(SchedError::InvalidConfig(
                "access point needs at least one antenna".into(),
            ));
        }
        info!(
            ap = %ap.address,
            max_stations = config.max_stations,
            ul_mu = config.enable_ul_mu,
            sensing = config.sensing.enabled,
            "MU scheduler created"
        );
        Ok(Self {
            ledger: FairnessLedger::new(config.max_credits()),
            config,
            ap,
            registry: StationRegistry::new(),
            last_format: None,
            last_trigger: None,
            opportunity: None,
            pending: Pending::None,
            sensing: SensingState::default(),
            stats: SchedulerStats::default(),
        })
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    pub fn access_point(&self) -> &AccessPoint {
        &self.ap
    }

    pub fn registry(&self) -> &StationRegistry {
        &self.registry
    }

    pub fn stats(&self) -> &SchedulerStats {
        &self.stats
    }

    pub fn last_format(&self) -> Option<TxFormat> {
        self.last_format
    }

    /// Kind of the last trigger frame handed out for uplink MU.
    pub fn last_trigger(&self) -> Option<TriggerKind> {
        self.last_trigger
    }

    /// Stations accepted into the last sounding round.
    pub fn sounding_round(&self) -> &[SoundingTarget] {
        &self.sensing.round
    }

    /// Stations that answered the last poll round.
    pub fn acknowledged_stations(&self) -> Vec<Aid> {
        self.sensing.acknowledged.iter().map(|c| c.aid).collect()
    }

    // ── Station lifecycle ───────────────────────────────────────────────

    /// Registers a newly associated station. Only MU-capable stations are
    /// scheduled; multi-link stations are keyed by their MLD address.
    pub fn on_station_associated<E: MacEnv + ?Sized>(&mut self, env: &E, aid: Aid, address: MacAddress) -> bool {
        if !env.supports_mu(address) {
            debug!(aid, %address, "station without MU support not registered");
            return false;
        }
        let address = env.mld_or_link_address(aid).unwrap_or(address);
        let added = self.registry.register(aid, address);
        if added {
            info!(aid, %address, "station registered");
        }
        added
    }

    /// Unregisters a station, unless it is still associated on another
    /// link of the same MLD.
    pub fn on_station_deassociated<E: MacEnv + ?Sized>(&mut self, env: &E, aid: Aid, address: MacAddress) -> bool {
        if !env.supports_mu(address) {
            return false;
        }
        let mld = env.mld_or_link_address(aid).unwrap_or(address);
        if env.is_associated(mld) {
            debug!(aid, %mld, "still associated on another link");
            return false;
        }
        self.sensing.forget(aid);
        let removed = self.registry.unregister(aid);
        if removed {
            info!(aid, %address, "station unregistered");
        }
        removed
    }

    /// Records a CTS answering the last poll round.
    pub fn on_poll_acknowledged(&mut self, address: MacAddress) -> bool {
        let acknowledged = self.sensing.acknowledge(address, self.config.sensing.mode);
        if acknowledged {
            debug!(%address, pool = self.sensing.acknowledged.len(), "poll acknowledged");
        } else {
            debug!(%address, "acknowledgement from a station that was not polled");
        }
        acknowledged
    }

    // ── Format selection ────────────────────────────────────────────────

    pub fn select_tx_format<E: MacEnv + ?Sized>(&mut self, env: &mut E, opp: TxOpportunity) -> TxFormat {
        self.pending = Pending::None;
        self.opportunity = Some(opp);
        let format = self.decide(env, &opp);
        self.stats.record(format);
        self.last_format = Some(format);
        debug!(?format, ac = ?opp.primary_ac, width = %opp.width, "TX format selected");
        format
    }

    fn decide<E: MacEnv + ?Sized>(&mut self, env: &mut E, opp: &TxOpportunity) -> TxFormat {
        let head = env.peek(opp.primary_ac, None, None);

        if self.config.sensing.enabled && head.as_ref().is_some_and(QueuedFrame::is_sensing_poll) {
            return self.sensing_step(env, opp);
        }

        if let Some(frame) = &head {
            if !env.supports_mu(frame.receiver) {
                return TxFormat::SingleUser;
            }
        }

        let after_dl_mu = self.last_format == Some(TxFormat::DownlinkMu);
        if self.config.enable_ul_mu && self.config.enable_bsrp && (after_dl_mu || head.is_none()) {
            if let Some(format) = self.try_uplink(&*env, opp, TriggerKind::Bsrp) {
                return format;
            }
        } else if self.config.enable_ul_mu
            && (after_dl_mu || self.last_trigger == Some(TriggerKind::Bsrp) || head.is_none())
        {
            if let Some(format) = self.try_uplink(&*env, opp, TriggerKind::Basic) {
                return format;
            }
        }

        let list = self.registry.downlink(opp.primary_ac);
        if list.len() < usize::from(self.config.min_dl_mu_stations) {
            return TxFormat::SingleUser;
        }
        match downlink::assemble(&*env, &self.config, opp, list, head.as_ref()) {
            DownlinkOutcome::Built(build) => {
                self.pending = Pending::Downlink(build);
                TxFormat::DownlinkMu
            }
            DownlinkOutcome::SingleUser => TxFormat::SingleUser,
            DownlinkOutcome::NoTransmission => TxFormat::NoTransmission,
        }
    }

    /// `None` when the trigger has nobody to solicit and DL MU should be
    /// tried instead.
    fn try_uplink<E: MacEnv + ?Sized>(&mut self, env: &E, opp: &TxOpportunity, kind: TriggerKind) -> Option<TxFormat> {
        let list = self.registry.uplink();
        let outcome = match kind {
            TriggerKind::Basic => uplink::try_basic(env, &self.config, &self.ap, opp, list),
            _ => uplink::try_bsrp(env, &self.config, &self.ap, opp, list),
        };
        match outcome {
            UplinkOutcome::Built(build) => {
                self.pending = Pending::Uplink(build);
                Some(TxFormat::UplinkMu)
            }
            UplinkOutcome::FallThrough => None,
            UplinkOutcome::SingleUser => Some(TxFormat::SingleUser),
            UplinkOutcome::NoTransmission => Some(TxFormat::NoTransmission),
        }
    }

    fn sensing_step<E: MacEnv + ?Sized>(&mut self, env: &mut E, opp: &TxOpportunity) -> TxFormat {
        if !self.config.sensing.sounding_enabled() {
            return self.try_poll(env, opp);
        }
        match (self.config.sensing.mode, self.last_format) {
            (SoundingMode::SuOnly, Some(TxFormat::Poll)) => self.try_su_announce(env, opp),
            (SoundingMode::SuOnly, Some(TxFormat::SoundingAnnounce(SoundingScope::Su)))
                if self.sensing.has_next_su() =>
            {
                self.try_su_announce(env, opp)
            }
            (SoundingMode::SuOnly, _) => self.try_poll(env, opp),
            (_, Some(TxFormat::Poll)) => {
                let pool = self.sensing.acknowledged.clone();
                self.try_announce(env, opp, &pool, SoundingScope::Mu)
            }
            _ => self.try_poll(env, opp),
        }
    }

    fn try_poll<E: MacEnv + ?Sized>(&mut self, env: &mut E, opp: &TxOpportunity) -> TxFormat {
        self.sensing.start_poll_round();
        let list = self.registry.downlink(opp.primary_ac);
        match sensing::try_poll(&*env, &self.config, &self.ap, opp, list) {
            Some(build) => {
                env.clear();
                self.sensing.polled = build.candidates.clone();
                self.pending = Pending::Poll(build);
                TxFormat::Poll
            }
            None => self.sensing_timeout(&*env, "poll round"),
        }
    }

    fn try_su_announce<E: MacEnv + ?Sized>(&mut self, env: &mut E, opp: &TxOpportunity) -> TxFormat {
        let pool: Vec<Candidate> = self.sensing.next_su().into_iter().collect();
        self.try_announce(env, opp, &pool, SoundingScope::Su)
    }

    fn try_announce<E: MacEnv + ?Sized>(
        &mut self,
        env: &mut E,
        opp: &TxOpportunity,
        pool: &[Candidate],
        scope: SoundingScope,
    ) -> TxFormat {
        match sensing::try_announce(env, &self.config, &self.ap, opp, pool) {
            Some(targets) => {
                self.stats.sounded_stations += targets.len() as u64;
                self.sensing.round = targets;
                TxFormat::SoundingAnnounce(scope)
            }
            None => self.sensing_timeout(&*env, "sounding announcement"),
        }
    }

    fn sensing_timeout<E: MacEnv + ?Sized>(&mut self, env: &E, phase: &str) -> TxFormat {
        let now = env.now();
        self.stats.record_sensing_timeout(now);
        warn!(phase, ?now, "sensing exchange does not fit the TXOP");
        TxFormat::NoTransmission
    }

    // ── Finalization ────────────────────────────────────────────────────

    /// Finalizes the DL MU PPDU chosen by the last decision.
    pub fn compute_downlink_info<E: MacEnv + ?Sized>(&mut self, env: &mut E) -> Option<DlInfo> {
        let build = match std::mem::take(&mut self.pending) {
            Pending::Downlink(build) => build,
            other => {
                self.pending = other;
                return None;
            }
        };
        let opp = self.opportunity?;
        let (info, served) = downlink::finalize(env, &self.config, &opp, build);
        let served: Vec<Aid> = served.iter().map(|c| c.aid).collect();
        self.ledger.settle(
            self.registry.downlink_mut(opp.primary_ac),
            info.tx_params.tx_duration,
            &info.tx_params.tx_vector,
            &served,
        );
        debug!(stations = served.len(), duration = ?info.tx_params.tx_duration, "DL MU PPDU finalized");
        Some(info)
    }

    /// Hands out the trigger chosen by the last decision.
    pub fn compute_uplink_info(&mut self) -> Option<UlInfo> {
        let build = match std::mem::take(&mut self.pending) {
            Pending::Uplink(build) => build,
            other => {
                self.pending = other;
                return None;
            }
        };
        let UplinkBuild {
            trigger,
            params,
            candidates,
            granted,
        } = build;
        if trigger.kind == TriggerKind::Basic {
            let served: Vec<Aid> = candidates.iter().map(|c| c.aid).collect();
            self.ledger
                .settle(self.registry.uplink_mut(), granted, &trigger.tb_vector(), &served);
        }
        self.last_trigger = Some(trigger.kind);
        Some(UlInfo {
            trigger,
            tx_params: params,
            granted,
        })
    }

    /// Hands out the poll round chosen by the last decision.
    pub fn compute_poll_info(&mut self) -> Option<PollInfo> {
        let build = match std::mem::take(&mut self.pending) {
            Pending::Poll(build) => build,
            other => {
                self.pending = other;
                return None;
            }
        };
        let opp = self.opportunity?;
        let served: Vec<Aid> = build.candidates.iter().map(|c| c.aid).collect();
        self.ledger.settle(
            self.registry.downlink_mut(opp.primary_ac),
            build.params.tx_duration,
            &build.params.tx_vector,
            &served,
        );
        Some(PollInfo {
            tx_params: build.params,
            polls: build.polls,
            trigger: build.trigger,
            trigger_params: build.trigger_params,
            response: build.response,
        })
    }
}
