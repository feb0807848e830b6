//! Calls executed by a smart account

use ethers::{
    abi::{Function, Token},
    types::{Address, Bytes, U256},
};
use serde::{Deserialize, Serialize};

/// Contract function and its arguments, encoded into call data when the call is prepared
#[derive(Clone, Debug, PartialEq)]
pub struct FunctionCall {
    pub function: Function,
    pub args: Vec<Token>,
}

/// A single target invocation. Calls of a user operation execute in the given order.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Call {
    /// Target of the call
    pub to: Address,
    /// Value (in wei) sent with the call
    #[serde(default)]
    pub value: U256,
    /// Call data
    #[serde(default)]
    pub data: Bytes,
    /// Function to encode into `data`
    #[serde(skip)]
    pub function: Option<FunctionCall>,
}

impl Call {
    pub fn new(to: Address) -> Self {
        Self { to, ..Default::default() }
    }

    /// Call of a contract function; its data is the ABI encoding of `args`
    pub fn function(to: Address, function: Function, args: Vec<Token>) -> Self {
        Self { to, function: Some(FunctionCall { function, args }), ..Default::default() }
    }

    /// Sets the value of the call
    pub fn value(mut self, value: U256) -> Self {
        self.value = value;
        self
    }

    /// Sets the data of the call
    pub fn data(mut self, data: Bytes) -> Self {
        self.data = data;
        self
    }

    /// Plain `{to, value, data}` form of the call. A function call replaces `data` with the
    /// selector followed by the encoded arguments.
    pub fn encode(self) -> Result<Self, ethers::abi::Error> {
        match self.function {
            Some(FunctionCall { function, args }) => Ok(Self {
                to: self.to,
                value: self.value,
                data: function.encode_input(&args)?.into(),
                function: None,
            }),
            None => Ok(self),
        }
    }
}
