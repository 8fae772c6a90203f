pub mod dispatch;
pub mod proxy;
pub mod selector;

pub use dispatch::*;
pub use proxy::*;
pub use selector::*;

use std::any::TypeId;

use async_trait::async_trait;
use strum_macros::{Display, EnumIter, EnumString};

use javelin_protocol::{ArgValue, Args, Result};

/// how the dispatcher base behind an executor kind may be derived from.
/// Anything but `Open` is rejected at proxy generation time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumIter, EnumString)]
pub enum DispatchBase {
    Open,
    Sealed,
    Abstract,
}

/// identity of the executor kind a generated proxy shape belongs to; the
/// first level of the shape cache key.
#[derive(Debug, Clone, Copy)]
pub struct DispatcherKind {
    pub id: TypeId,
    pub name: &'static str,
    pub base: DispatchBase,
}

impl DispatcherKind {
    pub fn of<E: 'static>(name: &'static str) -> DispatcherKind {
        DispatcherKind {
            id: TypeId::of::<E>(),
            name,
            base: DispatchBase::Open,
        }
    }
}

/// the collaborator performing the actual work behind an intercepted call.
/// The dispatch core owns nothing beyond this three-hook contract; failures
/// returned here reach the original caller unchanged.
///
/// Cancellation is not handled at this layer; hooks honor (or ignore)
/// whatever cancellation facility their transport has.
#[async_trait]
pub trait ProxyExecutor: Send + Sync + 'static {
    fn dispatcher(&self) -> DispatcherKind;

    fn invoke(&self, method: &ResolvedMethod, args: Args) -> Result<ArgValue>;

    async fn invoke_async(&self, method: &ResolvedMethod, args: Args) -> Result<()>;

    async fn invoke_async_typed(&self, method: &ResolvedMethod, args: Args) -> Result<ArgValue>;
}
