//! Advertisement scheduling
//!
//! Assembles one full round of Remote ID messages from a location fix and
//! pushes each frame, strictly one at a time, through the radio link's
//! set-advertisement-data command. Each frame replaces the module's single
//! active advertisement, so the round cycles the message kinds over the air.

use tracing::{debug, warn};

use crate::core::types::{AuthParams, Identity, LocationFix, OperatorParams, UasIdType};
use crate::core::Result;
use crate::protocol::message::{self, AUTH_PAGE_COUNT};
use crate::protocol::{AdvertisementFrame, MessageCounters};
use crate::radio::link::RadioLink;
use crate::radio::transport::Transport;
use crate::radio::{reply_complete, reply_failed, set_adv_data_command};

/// Outcome summary of one advertising round
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RoundReport {
    /// Frames acknowledged by the module
    pub sent: usize,
    /// Frames the module answered with an error
    pub rejected: usize,
    /// Frames whose exchange expired; the round continued regardless
    pub timed_out: usize,
}

impl RoundReport {
    /// Total frames pushed to the module this round
    pub fn frames(&self) -> usize {
        self.sent + self.rejected + self.timed_out
    }
}

/// Schedules Remote ID advertising rounds over a radio link
///
/// Owns the per-kind transmission counters; invoke [`Broadcaster::broadcast_round`]
/// once per fresh location fix to keep every message kind on the air within
/// the standard's update-rate requirement.
pub struct Broadcaster<T: Transport> {
    link: RadioLink<T>,
    counters: MessageCounters,
    identity: Identity,
    operator: OperatorParams,
    auth: AuthParams,
}

impl<T: Transport + 'static> Broadcaster<T> {
    /// Creates a scheduler broadcasting the given identity and parameters
    pub fn new(
        link: RadioLink<T>,
        identity: Identity,
        operator: OperatorParams,
        auth: AuthParams,
    ) -> Self {
        Broadcaster {
            link,
            counters: MessageCounters::new(),
            identity,
            operator,
            auth,
        }
    }

    /// The underlying radio link, e.g. for initialization
    pub fn link_mut(&mut self) -> &mut RadioLink<T> {
        &mut self.link
    }

    /// Current per-kind transmission counters
    pub fn counters(&self) -> &MessageCounters {
        &self.counters
    }

    /// Broadcasts one full round of messages built from `fix`
    ///
    /// The fixed order is: Basic ID (serial number), Basic ID (session ID),
    /// Location/Vector, the three Auth pages, Self ID, System, Operator ID.
    /// Message N+1 is only encoded once the exchange carrying message N has
    /// settled. A timed-out exchange is logged and the round continues; an
    /// encoding error aborts the remainder of the round.
    pub async fn broadcast_round(&mut self, fix: &LocationFix) -> Result<RoundReport> {
        let mut report = RoundReport::default();

        let frame = message::basic_id(
            &mut self.counters,
            UasIdType::SerialNumber,
            self.identity.ua_type,
            &self.identity.serial_number,
        )?;
        self.send_frame(frame, &mut report).await?;

        let frame = message::basic_id(
            &mut self.counters,
            UasIdType::SpecificSession,
            self.identity.ua_type,
            &self.identity.session_id,
        )?;
        self.send_frame(frame, &mut report).await?;

        let frame = message::location(&mut self.counters, fix)?;
        self.send_frame(frame, &mut report).await?;

        for page in 0..AUTH_PAGE_COUNT as u8 {
            let frame = message::auth_page(&mut self.counters, &self.auth, &fix.timestamp, page)?;
            self.send_frame(frame, &mut report).await?;
        }

        let frame = message::self_id(&mut self.counters, &self.operator.self_description)?;
        self.send_frame(frame, &mut report).await?;

        let frame = message::system(&mut self.counters, &self.operator, &fix.timestamp)?;
        self.send_frame(frame, &mut report).await?;

        let frame = message::operator_id(&mut self.counters, &self.operator.operator_id)?;
        self.send_frame(frame, &mut report).await?;

        debug!(
            "round complete: {} sent, {} rejected, {} timed out",
            report.sent, report.rejected, report.timed_out
        );
        Ok(report)
    }

    async fn send_frame(
        &mut self,
        frame: AdvertisementFrame,
        report: &mut RoundReport,
    ) -> Result<()> {
        debug!(
            "advertising {:?} ({} bytes)",
            frame.kind,
            frame.payload_len()
        );
        let command = set_adv_data_command(&frame.payload_hex);
        let timeout = self.link.config().response_timeout;
        let outcome = self
            .link
            .exchange(Some(&command), reply_complete, timeout)
            .await?;

        if !outcome.is_completed() {
            warn!("{:?} advertisement not acknowledged, continuing round", frame.kind);
            report.timed_out += 1;
        } else if reply_failed(outcome.data()) {
            warn!("module rejected {:?} advertisement data", frame.kind);
            report.rejected += 1;
        } else {
            report.sent += 1;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::{AuthType, UaType};
    use crate::core::{Error, MAX_ADVERTISEMENT_BYTES};
    use crate::protocol::MessageKind;
    use crate::radio::link::LinkConfig;
    use crate::radio::mock::{MockTransport, Scripted};
    use crate::util::from_hex;
    use chrono::DateTime;
    use std::time::Duration;

    fn test_config() -> LinkConfig {
        LinkConfig {
            poll_interval: Duration::from_millis(2),
            idle_power_off: Duration::from_secs(5),
            settle_delay: Duration::from_millis(5),
            response_timeout: Duration::from_millis(50),
            init_timeout: Duration::from_millis(100),
        }
    }

    fn sample_fix() -> LocationFix {
        LocationFix {
            timestamp: DateTime::from_timestamp(1_546_300_800 + 7200, 0).unwrap(),
            latitude: 52.473,
            longitude: 13.402,
            altitude_m: 100.0,
            ground_speed_ms: 12.0,
            vertical_speed_ms: 0.0,
            heading_motion_deg: 270.0,
            heading_vehicle_deg: 270.0,
            horiz_acc_m: 2.0,
            vert_acc_m: 4.0,
            speed_acc_ms: 0.5,
        }
    }

    fn sample_identity() -> Identity {
        Identity {
            serial_number: "INTCJ123-4567-890".to_string(),
            session_id: "TRACKER-SESSION-01".to_string(),
            ua_type: UaType::Other,
        }
    }

    fn sample_operator() -> OperatorParams {
        OperatorParams {
            operator_id: "FIN87astrdge12k8".to_string(),
            self_description: "Asset tracker".to_string(),
            ..OperatorParams::default()
        }
    }

    fn sample_auth() -> AuthParams {
        AuthParams {
            auth_type: AuthType::MessageSetSignature,
            payload: vec![0xA5; 40],
        }
    }

    fn all_ok_script() -> Vec<Scripted> {
        vec![Scripted::OnWrite("OK\r\n"); 9]
    }

    #[tokio::test]
    async fn test_round_sends_nine_frames_in_order() {
        let mock = MockTransport::new(all_ok_script());
        let link = RadioLink::new(mock, test_config());
        let mut broadcaster =
            Broadcaster::new(link, sample_identity(), sample_operator(), sample_auth());

        let report = broadcaster.broadcast_round(&sample_fix()).await.unwrap();
        assert_eq!(report.sent, 9);
        assert_eq!(report.frames(), 9);

        let transport = broadcaster.link_mut().transport();
        let transport = transport.lock().await;
        assert_eq!(transport.writes.len(), 9);

        // Every write is a set-adv-data command with a payload that fits a
        // legacy advertisement
        let mut kinds = Vec::new();
        for write in &transport.writes {
            let hex = write
                .strip_prefix("AT+BLEADVDATA=\"")
                .and_then(|rest| rest.strip_suffix('"'))
                .expect("set-adv-data command");
            let bytes = from_hex(hex).unwrap();
            assert!(bytes.len() <= MAX_ADVERTISEMENT_BYTES);
            kinds.push(bytes[6] >> 4);
        }
        assert_eq!(kinds, vec![0, 0, 1, 2, 2, 2, 3, 4, 5]);
    }

    #[tokio::test]
    async fn test_round_counters_after_two_rounds() {
        let mut script = all_ok_script();
        script.extend(all_ok_script());
        let mock = MockTransport::new(script);
        let link = RadioLink::new(mock, test_config());
        let mut broadcaster =
            Broadcaster::new(link, sample_identity(), sample_operator(), sample_auth());

        let fix = sample_fix();
        broadcaster.broadcast_round(&fix).await.unwrap();
        broadcaster.broadcast_round(&fix).await.unwrap();

        let counters = broadcaster.counters();
        // Two Basic ID frames per round
        assert_eq!(counters.current(MessageKind::BasicId), 3);
        // One transmission per round for the rest; Auth pages share one
        assert_eq!(counters.current(MessageKind::Location), 1);
        assert_eq!(counters.current(MessageKind::Auth), 1);
        assert_eq!(counters.current(MessageKind::SelfId), 1);
        assert_eq!(counters.current(MessageKind::System), 1);
        assert_eq!(counters.current(MessageKind::OperatorId), 1);
    }

    #[tokio::test]
    async fn test_timed_out_frame_does_not_abort_round() {
        let script = vec![
            Scripted::OnWrite("OK\r\n"),
            Scripted::OnWrite("OK\r\n"),
            Scripted::Ignore,
            Scripted::OnWrite("OK\r\n"),
            Scripted::OnWrite("OK\r\n"),
            Scripted::OnWrite("OK\r\n"),
            Scripted::OnWrite("OK\r\n"),
            Scripted::OnWrite("OK\r\n"),
            Scripted::OnWrite("OK\r\n"),
        ];
        let mock = MockTransport::new(script);
        let link = RadioLink::new(mock, test_config());
        let mut broadcaster =
            Broadcaster::new(link, sample_identity(), sample_operator(), sample_auth());

        let report = broadcaster.broadcast_round(&sample_fix()).await.unwrap();
        assert_eq!(report.sent, 8);
        assert_eq!(report.timed_out, 1);
        assert_eq!(report.frames(), 9);

        let transport = broadcaster.link_mut().transport();
        assert_eq!(transport.lock().await.writes.len(), 9);
    }

    #[tokio::test]
    async fn test_rejected_frame_is_counted() {
        let mut script = all_ok_script();
        script[4] = Scripted::OnWrite("ERROR\r\n");
        let mock = MockTransport::new(script);
        let link = RadioLink::new(mock, test_config());
        let mut broadcaster =
            Broadcaster::new(link, sample_identity(), sample_operator(), sample_auth());

        let report = broadcaster.broadcast_round(&sample_fix()).await.unwrap();
        assert_eq!(report.sent, 8);
        assert_eq!(report.rejected, 1);
    }

    #[tokio::test]
    async fn test_encoder_error_aborts_round() {
        let mock = MockTransport::new(all_ok_script());
        let link = RadioLink::new(mock, test_config());
        let mut identity = sample_identity();
        identity.session_id = "X".repeat(21);
        let mut broadcaster =
            Broadcaster::new(link, identity, sample_operator(), sample_auth());

        let err = broadcaster
            .broadcast_round(&sample_fix())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::LengthViolation { .. }));

        // Only the first Basic ID made it onto the wire
        let transport = broadcaster.link_mut().transport();
        assert_eq!(transport.lock().await.writes.len(), 1);
    }
}
