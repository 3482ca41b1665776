use std::time::Instant;

use chrono::{DateTime, Utc};

/// Fuente de tiempo del coordinador. En producción es el reloj del sistema;
/// en tests se avanza a mano para simular timeouts sin dormir.
pub trait Clock: Send + Sync {
    /// Reloj monótono, el que decide los vencimientos.
    fn now(&self) -> Instant;

    /// Hora de pared con la que se sella `started_at`.
    fn wall(&self) -> DateTime<Utc>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn wall(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
