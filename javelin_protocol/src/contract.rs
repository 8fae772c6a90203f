use std::any::{Any, TypeId};

use strum_macros::{Display, EnumIter, EnumString};

/// a type-erased argument or return value travelling through dispatch.
pub type ArgValue = Box<dyn Any + Send>;

pub type Args = Vec<ArgValue>;

/// identity of one method within its declaring contract. Tokens are
/// assigned in declaration order by the contract generator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MethodToken(pub u32);

/// the declared return shape of a contract method, which decides the
/// dispatcher entry point every call to it is routed through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumIter, EnumString)]
pub enum ReturnShape {
    Value,
    AsyncUnit,
    AsyncTyped,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumIter, EnumString)]
pub enum ContractShape {
    Interface,
    Concrete,
}

/// identity of a generic type argument carried by an invocation record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TypeTag {
    pub id: TypeId,
    pub name: &'static str,
}

impl TypeTag {
    pub fn of<T: Any>() -> TypeTag {
        TypeTag {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct MethodDescriptor {
    pub token: MethodToken,
    pub name: &'static str,
    pub arity: usize,
    /// number of generic type arguments an invocation must carry; zero for
    /// non-generic methods.
    pub generic_arity: usize,
    pub shape: ReturnShape,
}

/// the method table of one service interface, plus the contracts it
/// extends. `extends` entries carry their own tables recursively.
#[derive(Debug, Clone)]
pub struct ContractDescriptor {
    pub id: TypeId,
    pub name: &'static str,
    pub shape: ContractShape,
    pub methods: Vec<MethodDescriptor>,
    pub extends: Vec<ContractDescriptor>,
}

/// implemented by contract marker types, one per service interface.
/// Generated by `#[service_contract]`; hand-written only for descriptors
/// that come from somewhere other than a local trait definition.
pub trait ServiceContract: 'static {
    fn descriptor() -> ContractDescriptor;
}
