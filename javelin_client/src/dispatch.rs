use std::any::{Any, TypeId};

use javelin_protocol::{ArgValue, Args, Error, ErrorKind, MethodToken, Result, ReturnShape, TypeTag};

use crate::proxy::ProxyShape;
use crate::ProxyExecutor;

/// one intercepted call, packed by generated proxy code and consumed by
/// exactly one dispatcher entry point. Never shared across calls.
pub struct Invocation {
    /// the contract the invoked method is declared on, which may be one the
    /// proxied contract extends.
    pub contract: TypeId,
    pub token: MethodToken,
    /// generic type arguments; empty for non-generic methods.
    pub type_args: Vec<TypeTag>,
    pub args: Args,
    return_slot: Option<ArgValue>,
}

impl Invocation {
    pub fn new(contract: TypeId, token: MethodToken, type_args: Vec<TypeTag>, args: Args) -> Invocation {
        Invocation {
            contract,
            token,
            type_args,
            args,
            return_slot: None,
        }
    }

    /// takes the completed call's value out of the return slot.
    pub fn take_return(&mut self) -> Option<ArgValue> {
        self.return_slot.take()
    }
}

/// a method identity after token lookup and generic instantiation, handed
/// to the executor hooks.
#[derive(Debug, Clone)]
pub struct ResolvedMethod {
    pub contract: &'static str,
    pub name: &'static str,
    pub token: MethodToken,
    pub shape: ReturnShape,
    pub type_args: Vec<TypeTag>,
    /// the value type a typed-asynchronous call was instantiated with.
    pub returns: Option<TypeTag>,
}

fn resolve(shape: &ProxyShape, inv: &Invocation, entry: ReturnShape) -> Result<ResolvedMethod> {
    let (contract, descriptor) = shape.method(inv.contract, inv.token)?;
    if descriptor.shape != entry {
        return Err(Error::new(
            ErrorKind::MethodResolution,
            format!(
                "{}.{} is declared {} but was dispatched as {}",
                contract, descriptor.name, descriptor.shape, entry
            ),
        ));
    }
    if inv.args.len() != descriptor.arity {
        return Err(Error::new(
            ErrorKind::MethodResolution,
            format!(
                "{}.{} expects {} arguments, got {}",
                contract,
                descriptor.name,
                descriptor.arity,
                inv.args.len()
            ),
        ));
    }
    if inv.type_args.len() != descriptor.generic_arity {
        return Err(Error::new(
            ErrorKind::MethodResolution,
            format!(
                "{}.{} expects {} type arguments, got {}",
                contract,
                descriptor.name,
                descriptor.generic_arity,
                inv.type_args.len()
            ),
        ));
    }
    Ok(ResolvedMethod {
        contract,
        name: descriptor.name,
        token: descriptor.token,
        shape: descriptor.shape,
        type_args: inv.type_args.clone(),
        returns: None,
    })
}

/// synchronous entry point: resolves the method, runs the executor's
/// synchronous hook on the caller's thread and stores the produced value in
/// the record's return slot.
pub fn invoke(shape: &ProxyShape, executor: &dyn ProxyExecutor, inv: &mut Invocation) -> Result<()> {
    let method = resolve(shape, inv, ReturnShape::Value)?;
    let args = std::mem::take(&mut inv.args);
    let value = executor.invoke(&method, args)?;
    inv.return_slot = Some(value);
    Ok(())
}

/// no-value asynchronous entry point: the caller's future completes when
/// the executor's operation does.
pub async fn invoke_async(
    shape: &ProxyShape,
    executor: &dyn ProxyExecutor,
    inv: &mut Invocation,
) -> Result<()> {
    let method = resolve(shape, inv, ReturnShape::AsyncUnit)?;
    let args = std::mem::take(&mut inv.args);
    executor.invoke_async(&method, args).await
}

/// typed asynchronous entry point, instantiated with the value type `T` the
/// interface method was declared with. The executor's value is checked
/// against `T` before it is stored in the return slot.
pub async fn invoke_async_typed<T: Any + Send>(
    shape: &ProxyShape,
    executor: &dyn ProxyExecutor,
    inv: &mut Invocation,
) -> Result<()> {
    let mut method = resolve(shape, inv, ReturnShape::AsyncTyped)?;
    method.returns = Some(TypeTag::of::<T>());
    let args = std::mem::take(&mut inv.args);
    let value = executor.invoke_async_typed(&method, args).await?;
    match value.downcast::<T>() {
        Ok(value) => {
            let slot: ArgValue = value;
            inv.return_slot = Some(slot);
            Ok(())
        }
        Err(_) => Err(Error::new(
            ErrorKind::MethodResolution,
            format!(
                "{}.{} produced a value that is not a {}",
                method.contract,
                method.name,
                std::any::type_name::<T>()
            ),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::proxy::ProxyGenerator;
    use crate::{DispatcherKind, ProxyExecutor};
    use async_trait::async_trait;
    use futures::executor::block_on;
    use javelin_protocol::{
        ContractDescriptor, ContractShape, MethodDescriptor, ServiceContract,
    };
    use std::sync::Arc;

    struct Sample;

    impl ServiceContract for Sample {
        fn descriptor() -> ContractDescriptor {
            ContractDescriptor {
                id: TypeId::of::<Sample>(),
                name: "Sample",
                shape: ContractShape::Interface,
                methods: vec![
                    MethodDescriptor {
                        token: MethodToken(0),
                        name: "echo",
                        arity: 1,
                        generic_arity: 0,
                        shape: ReturnShape::Value,
                    },
                    MethodDescriptor {
                        token: MethodToken(1),
                        name: "warm",
                        arity: 0,
                        generic_arity: 0,
                        shape: ReturnShape::AsyncUnit,
                    },
                    MethodDescriptor {
                        token: MethodToken(2),
                        name: "fetch",
                        arity: 1,
                        generic_arity: 1,
                        shape: ReturnShape::AsyncTyped,
                    },
                ],
                extends: vec![],
            }
        }
    }

    struct EchoExecutor;

    #[async_trait]
    impl ProxyExecutor for EchoExecutor {
        fn dispatcher(&self) -> DispatcherKind {
            DispatcherKind::of::<EchoExecutor>("EchoExecutor")
        }
        fn invoke(&self, _method: &ResolvedMethod, mut args: Args) -> Result<ArgValue> {
            Ok(args.pop().unwrap())
        }
        async fn invoke_async(&self, _method: &ResolvedMethod, _args: Args) -> Result<()> {
            Ok(())
        }
        async fn invoke_async_typed(
            &self,
            _method: &ResolvedMethod,
            mut args: Args,
        ) -> Result<ArgValue> {
            Ok(args.pop().unwrap())
        }
    }

    struct FailingExecutor;

    #[async_trait]
    impl ProxyExecutor for FailingExecutor {
        fn dispatcher(&self) -> DispatcherKind {
            DispatcherKind::of::<FailingExecutor>("FailingExecutor")
        }
        fn invoke(&self, _method: &ResolvedMethod, _args: Args) -> Result<ArgValue> {
            Err(Error::new(ErrorKind::Network, "connection reset"))
        }
        async fn invoke_async(&self, _method: &ResolvedMethod, _args: Args) -> Result<()> {
            Err(Error::new(ErrorKind::Client, "server not found"))
        }
        async fn invoke_async_typed(
            &self,
            _method: &ResolvedMethod,
            _args: Args,
        ) -> Result<ArgValue> {
            Err(Error::new(ErrorKind::Network, "connection reset"))
        }
    }

    fn shape_with(executor: &dyn ProxyExecutor) -> Arc<ProxyShape> {
        let generator = ProxyGenerator::new();
        generator
            .shape_for::<Sample>(&executor.dispatcher())
            .unwrap()
    }

    #[test]
    fn sync_call_fills_return_slot() {
        let shape = shape_with(&EchoExecutor);
        let mut inv = Invocation::new(
            TypeId::of::<Sample>(),
            MethodToken(0),
            vec![],
            vec![Box::new(7u64) as ArgValue],
        );
        invoke(&shape, &EchoExecutor, &mut inv).unwrap();
        let value = inv.take_return().unwrap().downcast::<u64>().unwrap();
        assert_eq!(7, *value);
        assert!(inv.take_return().is_none());
    }

    #[test]
    fn unknown_token_is_a_resolution_failure() {
        let shape = shape_with(&EchoExecutor);
        let mut inv = Invocation::new(TypeId::of::<Sample>(), MethodToken(9), vec![], vec![]);
        let err = invoke(&shape, &EchoExecutor, &mut inv).unwrap_err();
        assert_eq!(ErrorKind::MethodResolution, err.kind());
    }

    #[test]
    fn argument_arity_is_checked() {
        let shape = shape_with(&EchoExecutor);
        let mut inv = Invocation::new(TypeId::of::<Sample>(), MethodToken(0), vec![], vec![]);
        let err = invoke(&shape, &EchoExecutor, &mut inv).unwrap_err();
        assert_eq!(ErrorKind::MethodResolution, err.kind());
        assert!(err.message().contains("expects 1 arguments"));
    }

    #[test]
    fn generic_arity_is_checked() {
        let shape = shape_with(&EchoExecutor);
        let mut inv = Invocation::new(
            TypeId::of::<Sample>(),
            MethodToken(2),
            vec![],
            vec![Box::new("k".to_owned()) as ArgValue],
        );
        let err = block_on(invoke_async_typed::<u64>(&shape, &EchoExecutor, &mut inv)).unwrap_err();
        assert_eq!(ErrorKind::MethodResolution, err.kind());
        assert!(err.message().contains("type arguments"));
    }

    #[test]
    fn entry_point_must_match_declared_shape() {
        let shape = shape_with(&EchoExecutor);
        let mut inv = Invocation::new(TypeId::of::<Sample>(), MethodToken(1), vec![], vec![]);
        let err = invoke(&shape, &EchoExecutor, &mut inv).unwrap_err();
        assert_eq!(ErrorKind::MethodResolution, err.kind());
        assert!(err.message().contains("declared AsyncUnit"));
    }

    #[test]
    fn typed_call_validates_the_produced_value() {
        let shape = shape_with(&EchoExecutor);
        let mut inv = Invocation::new(
            TypeId::of::<Sample>(),
            MethodToken(2),
            vec![TypeTag::of::<u64>()],
            vec![Box::new("not a u64".to_owned()) as ArgValue],
        );
        let err = block_on(invoke_async_typed::<u64>(&shape, &EchoExecutor, &mut inv)).unwrap_err();
        assert_eq!(ErrorKind::MethodResolution, err.kind());
        assert!(err.message().contains("not a u64"));
    }

    #[test]
    fn typed_call_records_its_instantiation() {
        struct Probe;

        #[async_trait]
        impl ProxyExecutor for Probe {
            fn dispatcher(&self) -> DispatcherKind {
                DispatcherKind::of::<Probe>("Probe")
            }
            fn invoke(&self, _method: &ResolvedMethod, _args: Args) -> Result<ArgValue> {
                unreachable!()
            }
            async fn invoke_async(&self, _method: &ResolvedMethod, _args: Args) -> Result<()> {
                unreachable!()
            }
            async fn invoke_async_typed(
                &self,
                method: &ResolvedMethod,
                _args: Args,
            ) -> Result<ArgValue> {
                assert_eq!(Some(TypeTag::of::<u64>()), method.returns);
                assert_eq!(TypeTag::of::<String>(), method.type_args[0]);
                Ok(Box::new(3u64) as ArgValue)
            }
        }

        let shape = shape_with(&Probe);
        let mut inv = Invocation::new(
            TypeId::of::<Sample>(),
            MethodToken(2),
            vec![TypeTag::of::<String>()],
            vec![Box::new("k".to_owned()) as ArgValue],
        );
        block_on(invoke_async_typed::<u64>(&shape, &Probe, &mut inv)).unwrap();
        assert_eq!(3, *inv.take_return().unwrap().downcast::<u64>().unwrap());
    }

    #[test]
    fn executor_failures_pass_through_unchanged() {
        let shape = shape_with(&FailingExecutor);
        let mut inv = Invocation::new(
            TypeId::of::<Sample>(),
            MethodToken(0),
            vec![],
            vec![Box::new(1u64) as ArgValue],
        );
        let err = invoke(&shape, &FailingExecutor, &mut inv).unwrap_err();
        assert_eq!(Error::new(ErrorKind::Network, "connection reset"), err);

        let mut inv = Invocation::new(TypeId::of::<Sample>(), MethodToken(1), vec![], vec![]);
        let err = block_on(invoke_async(&shape, &FailingExecutor, &mut inv)).unwrap_err();
        assert_eq!(Error::new(ErrorKind::Client, "server not found"), err);
    }
}
