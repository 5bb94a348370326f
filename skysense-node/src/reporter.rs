use alloc::vec::Vec;
use core::future::Future;
use core::net::SocketAddrV6;
use core::pin::pin;

use embassy_futures::select::{Either, select};
use embassy_time::{Ticker, Timer};
use log::{info, warn};
use rand::Rng;

use crate::error::{Error, Result};
use crate::net::Datagram;
use crate::net::address::{self, PrefixSource, REPORT_PORT};
use crate::schedule::PeriodicSchedule;
use crate::sensor::{SensorBus, SensorKind};

/// Largest encoded report, terminator included.
pub const MAX_REPORT_LEN: usize = 50;

/// One temperature/humidity report as it travels on the wire:
/// `"Temperatura: <int>, Humedad: <int>"`, NUL-terminated ASCII.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Report {
    pub temperature: i32,
    pub humidity: i32,
}

impl Report {
    pub fn encode(&self) -> Result<Vec<u8>> {
        let text = alloc::format!(
            "Temperatura: {}, Humedad: {}",
            self.temperature,
            self.humidity
        );

        if text.len() + 1 > MAX_REPORT_LEN {
            return Err(Error::PayloadTooLarge);
        }

        let mut payload = text.into_bytes();
        payload.push(0);
        Ok(payload)
    }

    /// Inverse of [`encode`](Self::encode). Accepts payloads with or
    /// without the trailing NUL, since not every peer sends it.
    pub fn parse(payload: &[u8]) -> Result<Self> {
        let body = match payload.split_last() {
            Some((0, body)) => body,
            _ => payload,
        };

        let text = core::str::from_utf8(body).map_err(|_| Error::MalformedReport)?;
        let rest = text
            .strip_prefix("Temperatura: ")
            .ok_or(Error::MalformedReport)?;
        let (temperature, humidity) = rest
            .split_once(", Humedad: ")
            .ok_or(Error::MalformedReport)?;

        Ok(Self {
            temperature: temperature.parse().map_err(|_| Error::MalformedReport)?,
            humidity: humidity.parse().map_err(|_| Error::MalformedReport)?,
        })
    }
}

/// Periodic jittered sender.
///
/// Each cycle waits for the period tick, then a freshly drawn jitter delay,
/// then sends exactly one report to the fixed neighbor. The randomized
/// offset keeps a field of nodes from transmitting in lockstep.
pub struct Reporter<T, S, P, R> {
    transport: T,
    sensors: S,
    prefix: P,
    rng: R,
    schedule: PeriodicSchedule,
    last_temperature: i32,
    last_humidity: i32,
}

impl<T, S, P, R> Reporter<T, S, P, R>
where
    T: Datagram,
    S: SensorBus,
    P: PrefixSource,
    R: Rng,
{
    pub fn new(transport: T, sensors: S, prefix: P, schedule: PeriodicSchedule, rng: R) -> Self {
        Self {
            transport,
            sensors,
            prefix,
            rng,
            schedule,
            last_temperature: 0,
            last_humidity: 0,
        }
    }

    pub fn schedule(&self) -> PeriodicSchedule {
        self.schedule
    }

    /// Period ticker for [`run_cycle`](Self::run_cycle). Periods are
    /// measured expiry to expiry, so the jitter delay never stretches the
    /// cycle length.
    pub fn start_ticker(&self) -> Ticker {
        Ticker::every(self.schedule.period())
    }

    pub async fn run(&mut self) -> ! {
        let mut ticker = self.start_ticker();

        loop {
            if let Err(err) = self.run_cycle(&mut ticker).await {
                warn!("Report cycle degraded: {}", err);
            }
        }
    }

    /// One full cycle: wait for the period tick, wait out the jitter, send
    /// one report. A transport failure is logged and absorbed; a sensor
    /// failure is substituted with the last good value and returned so the
    /// caller can observe it. Neither stops the next cycle.
    pub async fn run_cycle(&mut self, ticker: &mut Ticker) -> Result<()> {
        self.wait_logging_inbound(ticker.next()).await;

        let jitter = self.schedule.draw_jitter(&mut self.rng);
        self.wait_logging_inbound(Timer::after(jitter)).await;

        self.send_report().await
    }

    /// Wait out `wait`, draining the report socket in the meantime. Every
    /// inbound datagram is logged and otherwise ignored; it never alters
    /// the cycle timing or the reporter's state.
    async fn wait_logging_inbound<F: Future>(&mut self, wait: F) {
        let mut wait = pin!(wait);

        loop {
            let mut buffer = [0u8; MAX_REPORT_LEN];

            match select(wait.as_mut(), self.transport.receive_from(&mut buffer)).await {
                Either::First(_) => break,
                Either::Second(Ok(Some((len, source)))) => {
                    let body = buffer[..len].strip_suffix(&[0]).unwrap_or(&buffer[..len]);
                    info!(
                        "Received data from {} with length {}: '{}'",
                        source,
                        len,
                        core::str::from_utf8(body).unwrap_or("<non-ascii>")
                    );
                }
                Either::Second(_) => {
                    // Medium idle or failed; just finish the wait.
                    wait.as_mut().await;
                    break;
                }
            }
        }
    }

    async fn send_report(&mut self) -> Result<()> {
        // Re-derive the destination every cycle; the advertised prefix may
        // have been renumbered since the last send.
        let destination = SocketAddrV6::new(
            address::peer_address(self.prefix.default_prefix()),
            REPORT_PORT,
            0,
            0,
        );

        let (temperature, temperature_err) = self.sample(SensorKind::Temperature);
        let (humidity, humidity_err) = self.sample(SensorKind::Humidity);

        let report = Report {
            temperature,
            humidity,
        };
        let payload = report.encode()?;

        info!(
            "Sending unicast to {} with message: '{}'",
            destination,
            core::str::from_utf8(&payload[..payload.len() - 1]).unwrap_or("<non-ascii>")
        );

        if let Err(err) = self.transport.send_to(&payload, destination).await {
            // Fire and forget; the next cycle is unaffected.
            warn!("Report send failed: {}", err);
        }

        match (temperature_err, humidity_err) {
            (Some(err), _) | (None, Some(err)) => Err(err),
            (None, None) => Ok(()),
        }
    }

    fn sample(&mut self, kind: SensorKind) -> (i32, Option<Error>) {
        match self.sensors.read(kind) {
            Ok(reading) => {
                self.remember(kind, reading.value);
                (reading.value, None)
            }
            Err(err) => {
                let fallback = self.last(kind);
                warn!(
                    "{} read failed ({}), substituting {}",
                    kind.label(),
                    err,
                    fallback
                );
                (fallback, Some(err))
            }
        }
    }

    fn remember(&mut self, kind: SensorKind, value: i32) {
        match kind {
            SensorKind::Temperature => self.last_temperature = value,
            SensorKind::Humidity => self.last_humidity = value,
            SensorKind::Light => {}
        }
    }

    fn last(&self, kind: SensorKind) -> i32 {
        match kind {
            SensorKind::Temperature => self.last_temperature,
            SensorKind::Humidity => self.last_humidity,
            SensorKind::Light => 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use alloc::rc::Rc;
    use alloc::vec::Vec;
    use core::cell::{Cell, RefCell};

    use embassy_time::{Duration, Instant};
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    use super::*;
    use crate::net::address::StaticPrefix;

    type SentLog = Rc<RefCell<Vec<(Vec<u8>, SocketAddrV6, Instant)>>>;
    type InboundQueue = Rc<RefCell<Vec<(Vec<u8>, SocketAddrV6)>>>;

    struct RecordingTransport {
        sent: SentLog,
        inbound: InboundQueue,
        fail: bool,
    }

    impl RecordingTransport {
        fn new(fail: bool) -> (Self, SentLog) {
            let sent: SentLog = Rc::new(RefCell::new(Vec::new()));
            (
                Self {
                    sent: sent.clone(),
                    inbound: Rc::new(RefCell::new(Vec::new())),
                    fail,
                },
                sent,
            )
        }

        fn with_inbound(fail: bool) -> (Self, SentLog, InboundQueue) {
            let (transport, sent) = Self::new(fail);
            let inbound = transport.inbound.clone();
            (transport, sent, inbound)
        }
    }

    impl Datagram for RecordingTransport {
        async fn send_to(&mut self, payload: &[u8], destination: SocketAddrV6) -> Result<()> {
            self.sent
                .borrow_mut()
                .push((payload.to_vec(), destination, Instant::now()));

            if self.fail {
                Err(Error::NetworkError)
            } else {
                Ok(())
            }
        }

        async fn receive_from(
            &mut self,
            buffer: &mut [u8],
        ) -> Result<Option<(usize, SocketAddrV6)>> {
            let mut inbound = self.inbound.borrow_mut();
            if inbound.is_empty() {
                return Ok(None);
            }

            let (payload, source) = inbound.remove(0);
            buffer[..payload.len()].copy_from_slice(&payload);
            Ok(Some((payload.len(), source)))
        }
    }

    struct FixedBus {
        temperature: i32,
        humidity: i32,
    }

    impl SensorBus for FixedBus {
        fn read_raw(&mut self, kind: SensorKind) -> Result<i32> {
            match kind {
                SensorKind::Temperature => Ok(self.temperature),
                SensorKind::Humidity => Ok(self.humidity),
                SensorKind::Light => Err(Error::SensorUnavailable),
            }
        }
    }

    /// Humidity reads succeed `good_reads` times, then fail.
    struct DecayingBus {
        good_reads: usize,
    }

    impl SensorBus for DecayingBus {
        fn read_raw(&mut self, kind: SensorKind) -> Result<i32> {
            match kind {
                SensorKind::Temperature => Ok(21),
                SensorKind::Humidity => {
                    if self.good_reads > 0 {
                        self.good_reads -= 1;
                        Ok(55)
                    } else {
                        Err(Error::SensorUnavailable)
                    }
                }
                SensorKind::Light => Err(Error::SensorUnavailable),
            }
        }
    }

    /// Returns a different prefix on every query, counting them.
    struct RotatingPrefix {
        calls: Rc<Cell<usize>>,
    }

    impl PrefixSource for RotatingPrefix {
        fn default_prefix(&self) -> [u16; 4] {
            let n = self.calls.get();
            self.calls.set(n + 1);

            if n == 0 {
                [0xfd00, 0, 0, 0]
            } else {
                [0x2001, 0xdb8, 0, 0]
            }
        }
    }

    fn test_schedule(period_ms: u64, jitter_ms: u64) -> PeriodicSchedule {
        PeriodicSchedule::new(
            Duration::from_millis(period_ms),
            Duration::from_millis(jitter_ms),
        )
        .unwrap()
    }

    #[test]
    fn report_round_trips_over_valid_ranges() {
        for temperature in 0..=35 {
            for humidity in 40..=80 {
                let report = Report {
                    temperature,
                    humidity,
                };
                let payload = report.encode().unwrap();

                assert!(payload.len() <= MAX_REPORT_LEN);
                assert_eq!(payload.last(), Some(&0));
                assert_eq!(Report::parse(&payload).unwrap(), report);
            }
        }
    }

    #[test]
    fn report_wire_bytes_match() {
        let payload = Report {
            temperature: 23,
            humidity: 61,
        }
        .encode()
        .unwrap();
        assert_eq!(payload, b"Temperatura: 23, Humedad: 61\0");
    }

    #[test]
    fn parse_rejects_garbage() {
        assert_eq!(
            Report::parse(b"Temperature: 1, Humidity: 2").unwrap_err(),
            Error::MalformedReport
        );
        assert_eq!(
            Report::parse(b"Temperatura: x, Humedad: 2").unwrap_err(),
            Error::MalformedReport
        );
        assert_eq!(Report::parse(&[0xff, 0xfe]).unwrap_err(), Error::MalformedReport);
    }

    #[tokio::test]
    async fn zero_jitter_sends_right_after_period_expiry() {
        let (transport, sent) = RecordingTransport::new(false);
        let mut reporter = Reporter::new(
            transport,
            FixedBus {
                temperature: 20,
                humidity: 50,
            },
            StaticPrefix([0xfd00, 0, 0, 0]),
            test_schedule(50, 0),
            SmallRng::seed_from_u64(1),
        );

        let start = Instant::now();
        let mut ticker = reporter.start_ticker();
        reporter.run_cycle(&mut ticker).await.unwrap();

        let elapsed = Instant::now() - start;
        assert!(elapsed >= Duration::from_millis(50), "sent before period");
        assert!(elapsed < Duration::from_millis(120), "sent far too late");
        assert_eq!(sent.borrow().len(), 1);
    }

    #[tokio::test]
    async fn cycles_keep_period_then_jitter_then_single_send() {
        let (transport, sent) = RecordingTransport::new(false);
        let mut reporter = Reporter::new(
            transport,
            FixedBus {
                temperature: 20,
                humidity: 50,
            },
            StaticPrefix([0xfd00, 0, 0, 0]),
            test_schedule(50, 40),
            SmallRng::seed_from_u64(42),
        );

        let start = Instant::now();
        let mut ticker = reporter.start_ticker();
        for _ in 0..3 {
            reporter.run_cycle(&mut ticker).await.unwrap();
        }

        let sent = sent.borrow();
        assert_eq!(sent.len(), 3, "exactly one send per cycle");

        // First send no earlier than the first period expiry.
        assert!(sent[0].2 - start >= Duration::from_millis(50));

        // Spacing stays inside [0, period + jitter bound), with scheduler
        // slack on the upper side.
        for pair in sent.windows(2) {
            let gap = pair[1].2 - pair[0].2;
            assert!(gap < Duration::from_millis(50 + 40 + 40), "gap {:?}", gap);
        }
    }

    #[tokio::test]
    async fn destination_is_rederived_every_cycle() {
        let calls = Rc::new(Cell::new(0));
        let (transport, sent) = RecordingTransport::new(false);
        let mut reporter = Reporter::new(
            transport,
            FixedBus {
                temperature: 20,
                humidity: 50,
            },
            RotatingPrefix {
                calls: calls.clone(),
            },
            test_schedule(10, 0),
            SmallRng::seed_from_u64(1),
        );

        let mut ticker = reporter.start_ticker();
        reporter.run_cycle(&mut ticker).await.unwrap();
        reporter.run_cycle(&mut ticker).await.unwrap();

        assert_eq!(calls.get(), 2);

        let sent = sent.borrow();
        assert_eq!(
            sent[0].1.ip(),
            &"fd00::201:1:1:1".parse::<core::net::Ipv6Addr>().unwrap()
        );
        assert_eq!(
            sent[1].1.ip(),
            &"2001:db8::201:1:1:1".parse::<core::net::Ipv6Addr>().unwrap()
        );
        assert_eq!(sent[0].1.port(), REPORT_PORT);
    }

    #[tokio::test]
    async fn sensor_failure_substitutes_last_value_and_surfaces() {
        let (transport, sent) = RecordingTransport::new(false);
        let mut reporter = Reporter::new(
            transport,
            DecayingBus { good_reads: 1 },
            StaticPrefix([0xfd00, 0, 0, 0]),
            test_schedule(10, 0),
            SmallRng::seed_from_u64(1),
        );

        let mut ticker = reporter.start_ticker();

        // First cycle: humidity still reads fine.
        reporter.run_cycle(&mut ticker).await.unwrap();
        // Second cycle: humidity fails, last good value goes out instead.
        let err = reporter.run_cycle(&mut ticker).await.unwrap_err();
        assert_eq!(err, Error::SensorUnavailable);

        let sent = sent.borrow();
        assert_eq!(sent.len(), 2, "a failed sensor must not suppress the send");
        assert_eq!(
            Report::parse(&sent[1].0).unwrap(),
            Report {
                temperature: 21,
                humidity: 55
            }
        );
    }

    #[tokio::test]
    async fn sensor_failure_before_first_success_sends_sentinel() {
        let (transport, sent) = RecordingTransport::new(false);
        let mut reporter = Reporter::new(
            transport,
            DecayingBus { good_reads: 0 },
            StaticPrefix([0xfd00, 0, 0, 0]),
            test_schedule(10, 0),
            SmallRng::seed_from_u64(1),
        );

        let mut ticker = reporter.start_ticker();
        assert!(reporter.run_cycle(&mut ticker).await.is_err());

        assert_eq!(
            Report::parse(&sent.borrow()[0].0).unwrap(),
            Report {
                temperature: 21,
                humidity: 0
            }
        );
    }

    #[tokio::test]
    async fn inbound_traffic_is_drained_without_perturbing_the_cycle() {
        let (transport, sent, inbound) = RecordingTransport::with_inbound(false);
        let peer = SocketAddrV6::new(
            "fd00::201:1:1:1".parse().unwrap(),
            REPORT_PORT,
            0,
            0,
        );
        inbound
            .borrow_mut()
            .push((b"Temperatura: 9, Humedad: 44\0".to_vec(), peer));
        inbound.borrow_mut().push((b"ping".to_vec(), peer));

        let mut reporter = Reporter::new(
            transport,
            FixedBus {
                temperature: 20,
                humidity: 50,
            },
            StaticPrefix([0xfd00, 0, 0, 0]),
            test_schedule(50, 0),
            SmallRng::seed_from_u64(1),
        );

        let start = Instant::now();
        let mut ticker = reporter.start_ticker();
        reporter.run_cycle(&mut ticker).await.unwrap();

        // Inbound frames got consumed while waiting...
        assert!(inbound.borrow().is_empty());

        // ...without advancing or delaying the send.
        let elapsed = Instant::now() - start;
        assert!(elapsed >= Duration::from_millis(50), "inbound cut the period short");
        assert!(elapsed < Duration::from_millis(120));

        let sent = sent.borrow();
        assert_eq!(sent.len(), 1, "inbound traffic must not trigger extra sends");
        assert_eq!(
            Report::parse(&sent[0].0).unwrap(),
            Report {
                temperature: 20,
                humidity: 50
            }
        );
    }

    #[tokio::test]
    async fn transport_failure_never_breaks_the_loop() {
        let (transport, sent) = RecordingTransport::new(true);
        let mut reporter = Reporter::new(
            transport,
            FixedBus {
                temperature: 20,
                humidity: 50,
            },
            StaticPrefix([0xfd00, 0, 0, 0]),
            test_schedule(10, 0),
            SmallRng::seed_from_u64(1),
        );

        let mut ticker = reporter.start_ticker();
        reporter.run_cycle(&mut ticker).await.unwrap();
        reporter.run_cycle(&mut ticker).await.unwrap();

        assert_eq!(sent.borrow().len(), 2, "failed sends must not block cycles");
    }
}
