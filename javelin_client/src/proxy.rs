use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::marker::PhantomData;
use std::sync::{Arc, Mutex};

use tracing::{debug, trace};

use javelin_protocol::{
    Args, ContractDescriptor, ContractShape, Error, ErrorKind, MethodDescriptor, MethodToken,
    Result, ServiceContract, TypeTag,
};

use crate::dispatch::{self, Invocation};
use crate::{DispatchBase, DispatcherKind, ProxyExecutor};

/// one generated proxy implementation: the per-contract dispatch tables
/// shared by every proxy instance for a (dispatcher kind, contract) pair.
#[derive(Debug)]
pub struct ProxyShape {
    contract: &'static str,
    dispatcher: &'static str,
    contracts: HashMap<TypeId, ContractTable>,
}

#[derive(Debug)]
struct ContractTable {
    name: &'static str,
    methods: Vec<MethodDescriptor>,
}

impl ProxyShape {
    /// Unconditionally synthesizes a new shape for `kind` implementing
    /// `descriptor` and every contract it transitively extends.
    fn build(kind: &DispatcherKind, descriptor: &ContractDescriptor) -> Result<ProxyShape> {
        // Parameter validation is deferred until a shape actually has to be
        // generated, so cache hits are never revalidated.
        if descriptor.shape != ContractShape::Interface {
            return Err(Error::new(
                ErrorKind::InvalidContract,
                format!("{} is not interface-shaped", descriptor.name),
            ));
        }
        match kind.base {
            DispatchBase::Open => {}
            DispatchBase::Sealed => {
                return Err(Error::new(
                    ErrorKind::InvalidBase,
                    format!("dispatcher base of {} is sealed", kind.name),
                ))
            }
            DispatchBase::Abstract => {
                return Err(Error::new(
                    ErrorKind::InvalidBase,
                    format!("dispatcher base of {} is abstract", kind.name),
                ))
            }
        }

        let mut contracts = HashMap::new();
        collect(descriptor, &mut contracts)?;
        Ok(ProxyShape {
            contract: descriptor.name,
            dispatcher: kind.name,
            contracts,
        })
    }

    pub fn contract(&self) -> &'static str {
        self.contract
    }

    pub fn dispatcher(&self) -> &'static str {
        self.dispatcher
    }

    /// whether the shape implements `contract`, directly or through the
    /// extends chain.
    pub fn implements(&self, contract: TypeId) -> bool {
        self.contracts.contains_key(&contract)
    }

    pub(crate) fn method(
        &self,
        contract: TypeId,
        token: MethodToken,
    ) -> Result<(&'static str, &MethodDescriptor)> {
        let table = self.contracts.get(&contract).ok_or_else(|| {
            Error::new(
                ErrorKind::MethodResolution,
                format!("{} does not implement the declaring contract", self.contract),
            )
        })?;
        let descriptor = table
            .methods
            .get(token.0 as usize)
            .filter(|descriptor| descriptor.token == token)
            .ok_or_else(|| {
                Error::new(
                    ErrorKind::MethodResolution,
                    format!("{} has no method with token {}", table.name, token.0),
                )
            })?;
        Ok((table.name, descriptor))
    }
}

fn collect(descriptor: &ContractDescriptor, into: &mut HashMap<TypeId, ContractTable>) -> Result<()> {
    for extended in &descriptor.extends {
        if extended.shape != ContractShape::Interface {
            return Err(Error::new(
                ErrorKind::InvalidContract,
                format!("{} is not interface-shaped", extended.name),
            ));
        }
        collect(extended, into)?;
    }
    into.insert(
        descriptor.id,
        ContractTable {
            name: descriptor.name,
            methods: descriptor.methods.clone(),
        },
    );
    Ok(())
}

/// builds, caches and instantiates proxy implementations. The cache is
/// keyed by dispatcher kind first, contract second; exactly one shape is
/// ever generated per key for the generator's lifetime.
pub struct ProxyGenerator {
    caches: Mutex<HashMap<TypeId, HashMap<TypeId, Arc<ProxyShape>>>>,
}

impl Default for ProxyGenerator {
    fn default() -> Self {
        ProxyGenerator::new()
    }
}

impl ProxyGenerator {
    pub fn new() -> ProxyGenerator {
        ProxyGenerator {
            caches: Mutex::new(HashMap::new()),
        }
    }

    /// builds a proxy for contract `C` bound to `executor`. The shape is
    /// reused when one was already generated for this executor kind.
    pub fn create_proxy<C: ServiceContract>(
        &self,
        executor: Arc<dyn ProxyExecutor>,
    ) -> Result<Proxy<C>> {
        let shape = self.shape_for::<C>(&executor.dispatcher())?;
        Ok(Proxy {
            shape,
            executor,
            _contract: PhantomData,
        })
    }

    pub(crate) fn shape_for<C: ServiceContract>(
        &self,
        kind: &DispatcherKind,
    ) -> Result<Arc<ProxyShape>> {
        // one lock spans lookup and generate-and-insert; a loser of a race
        // for the same key observes the winner's entry here.
        let mut caches = self.caches.lock().unwrap();
        let interfaces = caches.entry(kind.id).or_insert_with(HashMap::new);
        let contract = TypeId::of::<C>();
        if let Some(shape) = interfaces.get(&contract) {
            trace!(
                contract = shape.contract(),
                dispatcher = shape.dispatcher(),
                "proxy shape cache hit"
            );
            return Ok(shape.clone());
        }

        let descriptor = C::descriptor();
        let shape = Arc::new(ProxyShape::build(kind, &descriptor)?);
        debug!(
            contract = descriptor.name,
            dispatcher = kind.name,
            "generated proxy shape"
        );
        interfaces.insert(contract, shape.clone());
        Ok(shape)
    }
}

/// a proxy instance: one shared shape bound to one executor. Clones are
/// cheap and all refer to the same generated implementation.
pub struct Proxy<C: ServiceContract> {
    shape: Arc<ProxyShape>,
    executor: Arc<dyn ProxyExecutor>,
    _contract: PhantomData<fn() -> C>,
}

impl<C: ServiceContract> std::fmt::Debug for Proxy<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Proxy").finish_non_exhaustive()
    }
}

impl<C: ServiceContract> Clone for Proxy<C> {
    fn clone(&self) -> Self {
        Proxy {
            shape: self.shape.clone(),
            executor: self.executor.clone(),
            _contract: PhantomData,
        }
    }
}

impl<C: ServiceContract> Proxy<C> {
    pub fn shape(&self) -> &Arc<ProxyShape> {
        &self.shape
    }

    fn pack(&self, token: MethodToken, type_args: Vec<TypeTag>, args: Args) -> Invocation {
        Invocation::new(TypeId::of::<C>(), token, type_args, args)
    }

    /// synchronous value call; used by generated contract implementations.
    pub fn invoke_value<R: Any>(
        &self,
        token: MethodToken,
        type_args: Vec<TypeTag>,
        args: Args,
    ) -> Result<R> {
        let mut inv = self.pack(token, type_args, args);
        dispatch::invoke(&self.shape, self.executor.as_ref(), &mut inv)?;
        take_typed(&mut inv)
    }

    /// no-value asynchronous call; used by generated contract
    /// implementations.
    pub async fn invoke_async(
        &self,
        token: MethodToken,
        type_args: Vec<TypeTag>,
        args: Args,
    ) -> Result<()> {
        let mut inv = self.pack(token, type_args, args);
        dispatch::invoke_async(&self.shape, self.executor.as_ref(), &mut inv).await
    }

    /// typed asynchronous call; used by generated contract implementations.
    pub async fn invoke_async_typed<R: Any + Send>(
        &self,
        token: MethodToken,
        type_args: Vec<TypeTag>,
        args: Args,
    ) -> Result<R> {
        let mut inv = self.pack(token, type_args, args);
        dispatch::invoke_async_typed::<R>(&self.shape, self.executor.as_ref(), &mut inv).await?;
        take_typed(&mut inv)
    }
}

fn take_typed<R: Any>(inv: &mut Invocation) -> Result<R> {
    let value = inv.take_return().ok_or_else(|| {
        Error::new(
            ErrorKind::MethodResolution,
            "call completed without a return value",
        )
    })?;
    value.downcast::<R>().map(|value| *value).map_err(|_| {
        Error::new(
            ErrorKind::MethodResolution,
            format!("return value is not a {}", std::any::type_name::<R>()),
        )
    })
}
