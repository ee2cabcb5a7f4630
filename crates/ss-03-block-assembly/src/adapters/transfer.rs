//! # Transfer Engine
//!
//! Reference [`ExecutionEngine`] for value transfers and contract creation.
//! Charges intrinsic gas only; it is not a virtual machine.
//!
//! ## Checks (in order)
//!
//! 1. Nonce equals the sender's account nonce
//! 2. Fee cap covers the block base fee
//! 3. Tip cap does not exceed the fee cap
//! 4. Blob fee cap covers the block blob fee
//! 5. Gas limit covers intrinsic gas
//! 6. Balance covers `gas_limit * fee_cap + value + blob_gas * blob_fee`

use shared_types::{
    keccak256, Address, ChainConfig, Header, SignedTransaction, RECEIPT_STATUS_SUCCESS, U256,
};
use ss_01_account_state::AccountStore;

use crate::domain::calc_blob_fee;
use crate::error::ExecutionError;
use crate::ports::{ExecutionEngine, ExecutionResult};

/// Address of a contract created by `sender` at `nonce`.
pub fn contract_address(sender: &Address, nonce: u64) -> Address {
    let mut preimage = Vec::with_capacity(28);
    preimage.extend_from_slice(sender.as_bytes());
    preimage.extend_from_slice(&nonce.to_be_bytes());
    Address::from_slice(&keccak256(&preimage).as_bytes()[12..])
}

#[derive(Debug, Clone, Default)]
pub struct TransferEngine {
    chain: ChainConfig,
}

impl TransferEngine {
    pub fn new(chain: ChainConfig) -> Self {
        Self { chain }
    }

    fn blob_fee(&self, header: &Header) -> U256 {
        if self.chain.is_cancun(header.number, header.timestamp) {
            calc_blob_fee(header.excess_blob_gas.unwrap_or(0))
        } else {
            U256::zero()
        }
    }
}

fn mul(a: U256, b: u64) -> U256 {
    a.saturating_mul(U256::from(b))
}

impl ExecutionEngine for TransferEngine {
    fn run(
        &self,
        state: &mut dyn AccountStore,
        header: &Header,
        tx: &SignedTransaction,
        sender: Address,
    ) -> Result<ExecutionResult, ExecutionError> {
        let nonce = state.nonce(&sender)?;
        if tx.nonce() < nonce {
            return Err(ExecutionError::NonceTooLow {
                address: sender,
                tx: tx.nonce(),
                state: nonce,
            });
        }
        if tx.nonce() > nonce {
            return Err(ExecutionError::NonceTooHigh {
                address: sender,
                tx: tx.nonce(),
                state: nonce,
            });
        }

        let fees = tx.fees();
        if let Some(base_fee) = header.base_fee {
            if fees.fee_cap() < base_fee {
                return Err(ExecutionError::FeeCapBelowBaseFee);
            }
        }
        if fees.tip_cap() > fees.fee_cap() {
            return Err(ExecutionError::TipAboveFeeCap);
        }

        let blob_fee = if tx.is_blob() {
            let fee = self.blob_fee(header);
            if tx.tx.max_fee_per_blob_gas.unwrap_or_default() < fee {
                return Err(ExecutionError::BlobFeeCapTooLow);
            }
            fee
        } else {
            U256::zero()
        };

        let intrinsic = tx.intrinsic_gas();
        if tx.gas_limit() < intrinsic {
            return Err(ExecutionError::IntrinsicGas {
                have: tx.gas_limit(),
                want: intrinsic,
            });
        }

        let blob_cost = mul(blob_fee, tx.blob_gas());
        let max_cost = mul(fees.fee_cap(), tx.gas_limit())
            .saturating_add(tx.value())
            .saturating_add(blob_cost);
        if state.balance(&sender)? < max_cost {
            return Err(ExecutionError::InsufficientFunds { address: sender });
        }

        let gas_used = intrinsic;
        let price = fees.effective_gas_price(header.base_fee);
        state.sub_balance(&sender, mul(price, gas_used).saturating_add(blob_cost))?;
        state.set_nonce(&sender, nonce + 1)?;
        let tip = fees.effective_tip(header.base_fee);
        state.add_balance(&header.coinbase, mul(tip, gas_used))?;

        let contract = match tx.to() {
            Some(to) => {
                state.sub_balance(&sender, tx.value())?;
                state.add_balance(&to, tx.value())?;
                None
            }
            None => {
                let created = contract_address(&sender, nonce);
                state.sub_balance(&sender, tx.value())?;
                state.add_balance(&created, tx.value())?;
                state.set_code(&created, tx.tx.data.clone())?;
                Some(created)
            }
        };

        Ok(ExecutionResult {
            gas_used,
            blob_gas_used: tx.blob_gas(),
            status: RECEIPT_STATUS_SUCCESS,
            contract_address: contract,
        })
    }
}
