//! Solidity bindings for the universal signature validator.
//!
//! - [`Validator6492`] - the deployed EIP-6492 validator
//! - [`ValidateSigOffchain`] - constructor of the deployless variant, whose
//!   creation code runs the same routine and returns the verdict
//! - [`VALIDATE_SIG_OFFCHAIN_BYTECODE`] - that creation code

use alloy_primitives::{Bytes, bytes};
use alloy_sol_types::sol;

sol! {
    /// Universal EIP-6492 validator.
    ///
    /// Deploys counterfactual wallets through their factory, then checks
    /// EIP-1271 or ECDSA. The side-effect variant keeps the deployment inside
    /// the simulated call.
    ///
    /// Reference: <https://eips.ethereum.org/EIPS/eip-6492>
    #[allow(missing_docs)]
    #[derive(Debug)]
    interface Validator6492 {
        function isValidSig(address signer, bytes32 hash, bytes calldata signature) external returns (bool);
        function isValidSigWithSideEffects(address signer, bytes32 hash, bytes calldata signature) external returns (bool);
        error ERC1271Revert(bytes error);
        error ERC6492DeployFailed(bytes error);
    }
}

sol! {
    /// Deployless validator. The creation code ends with `return(31, 1)`,
    /// so the call answers with a single byte.
    #[allow(missing_docs)]
    #[derive(Debug)]
    contract ValidateSigOffchain {
        constructor(address _signer, bytes32 _hash, bytes memory _signature);
    }
}

/// Creation code of [`ValidateSigOffchain`].
///
/// Run as an `eth_call` with no `to` and the constructor arguments appended.
/// The constructor deploys a counterfactual wallet when the signature is an
/// EIP-6492 envelope, checks `isValidSignature` when the signer has code and
/// falls back to `ecrecover` otherwise. It never leaves code behind: the
/// verdict is returned as one byte, `0x01` for valid.
pub static VALIDATE_SIG_OFFCHAIN_BYTECODE: Bytes = bytes!(
    "60806040523480156200001157600080fd5b506040516200070a3803806200070a833981016040819052620000349162"
    "00056f565b6000620000438484846200004f565b9050806000526001601ff35b600080846001600160a01b0316803b80"
    "6020016040519081016040528181526000908060200190933c90507f6492649264926492649264926492649264926492"
    "649264926492649264926492620000a68462000451565b036200021f57600060608085806020019051810190620000c7"
    "9190620005ce565b8651929550909350915060000362000192576000836001600160a01b031683604051620000f59190"
    "6200064d565b6000604051808303816000865af19150503d806000811462000134576040519150601f19603f3d011682"
    "016040523d82523d6000602084013e62000139565b606091505b5050905080620001905760405162461bcd60e51b8152"
    "60206004820152601e60248201527f5369676e617475726556616c696461746f723a206465706c6f796d656e74000060"
    "448201526064015b60405180910390fd5b505b604051630b135d3f60e11b808252906001600160a01b038a1690631626"
    "ba7e90620001c4908b9086906004016200066b565b602060405180830381865afa158015620001e2573d6000803e3d60"
    "00fd5b505050506040513d601f19601f82011682018060405250810190620002089190620006a7565b6001600160e01b"
    "031916149450505050506200044a565b805115620002b157604051630b135d3f60e11b808252906001600160a01b0387"
    "1690631626ba7e906200025990889088906004016200066b565b602060405180830381865afa15801562000277573d60"
    "00803e3d6000fd5b505050506040513d601f19601f820116820180604052508101906200029d9190620006a7565b6001"
    "600160e01b031916149150506200044a565b8251604114620003195760405162461bcd60e51b81526020600482015260"
    "3a6024820152600080516020620006ea83398151915260448201527f3a20696e76616c6964207369676e617475726520"
    "6c656e677468000000000000606482015260840162000187565b620003236200046b565b506020830151604080850151"
    "855186939260009185919081106200034b576200034b620006d3565b016020015160f81c9050601b8114801590620003"
    "6b57508060ff16601c14155b15620003cf5760405162461bcd60e51b815260206004820152603b602482015260008051"
    "6020620006ea83398151915260448201527f3a20696e76616c6964207369676e617475726520762076616c7565000000"
    "0000606482015260840162000187565b6040805160008152602081018083528a905260ff831691810191909152606081"
    "01849052608081018390526001600160a01b038a169060019060a0016020604051602081039080840390855afa158015"
    "6200042e573d6000803e3d6000fd5b505050602060405103516001600160a01b031614955050505050505b9392505050"
    "565b60006020825110156200046357600080fd5b508051015190565b6040518060600160405280600390602082028036"
    "8337509192915050565b6001600160a01b03811681146200049f57600080fd5b50565b634e487b7160e01b6000526041"
    "60045260246000fd5b60005b83811015620004d5578181015183820152602001620004bb565b50506000910152565b60"
    "0082601f830112620004f057600080fd5b81516001600160401b03808211156200050d576200050d620004a2565b6040"
    "51601f8301601f19908116603f01168101908282118183101715620005385762000538620004a2565b81604052838152"
    "8660208588010111156200055257600080fd5b62000565846020830160208901620004b8565b9695505050505050565b"
    "6000806000606084860312156200058557600080fd5b8351620005928162000489565b60208501516040860151919450"
    "92506001600160401b03811115620005b657600080fd5b620005c486828701620004de565b9150509250925092565b60"
    "0080600060608486031215620005e457600080fd5b8351620005f18162000489565b6020850151909350600160016040"
    "1b03808211156200060f57600080fd5b6200061d87838801620004de565b935060408601519150808211156200063457"
    "600080fd5b506200064386828701620004de565b9150509250925092565b6000825162000661818460208701620004b8"
    "565b9190910192915050565b828152604060208201526000825180604084015262000692816060850160208701620004"
    "b8565b601f01601f1916919091016060019392505050565b600060208284031215620006ba57600080fd5b8151600160"
    "0160e01b0319811681146200044a57600080fd5b634e487b7160e01b600052603260045260246000fdfe5369676e6174"
    "75726556616c696461746f72237265636f7665725369676e6572"
);
