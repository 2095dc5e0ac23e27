use crate::error::Result;

/// Downstream consumer of decoded parameters, e.g. a message broker client.
///
/// The bridge calls [`Publisher::maintain`] once per loop iteration, whether
/// or not a frame arrived, so connection upkeep runs on a silent bus too.
/// It must not block much longer than the receive timeout.
pub trait Publisher {
    /// Deliver one reading. `kind` is `"sensor"`, `"relay"` or `"overview"`.
    fn publish(&mut self, kind: &str, name: &str, value: i64) -> Result<()>;

    /// Periodic connection upkeep.
    fn maintain(&mut self) -> Result<()>;
}

impl<P: Publisher + ?Sized> Publisher for &mut P {
    fn publish(&mut self, kind: &str, name: &str, value: i64) -> Result<()> {
        (**self).publish(kind, name, value)
    }

    fn maintain(&mut self) -> Result<()> {
        (**self).maintain()
    }
}

impl<P: Publisher + ?Sized> Publisher for Box<P> {
    fn publish(&mut self, kind: &str, name: &str, value: i64) -> Result<()> {
        (**self).publish(kind, name, value)
    }

    fn maintain(&mut self) -> Result<()> {
        (**self).maintain()
    }
}
