// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Token call shapes and calldata argument extraction.

use alloy::{
    primitives::{Address, U256},
    sol,
    sol_types::SolCall,
};

// Token interfaces the authoriser and the in-memory ledger understand
sol! {
    interface IERC20 {
        function balanceOf(address account) external view returns (uint256);
        function transfer(address to, uint256 amount) external returns (bool);
        function allowance(address owner, address spender) external view returns (uint256);
        function approve(address spender, uint256 amount) external returns (bool);
        function increaseAllowance(address spender, uint256 addedValue) external returns (bool);
        function transferFrom(address from, address to, uint256 amount) external returns (bool);
    }

    interface IERC721 {
        function setApprovalForAll(address operator, bool approved) external;
    }
}

pub const TRANSFER: [u8; 4] = IERC20::transferCall::SELECTOR;
pub const APPROVE: [u8; 4] = IERC20::approveCall::SELECTOR;
pub const INCREASE_ALLOWANCE: [u8; 4] = IERC20::increaseAllowanceCall::SELECTOR;
pub const TRANSFER_FROM: [u8; 4] = IERC20::transferFromCall::SELECTOR;
pub const SET_APPROVAL_FOR_ALL: [u8; 4] = IERC721::setApprovalForAllCall::SELECTOR;

/// Calls that grant another party the right to move the wallet's assets.
/// The grantee is always the first argument.
pub const APPROVAL_SELECTORS: [[u8; 4]; 3] = [APPROVE, INCREASE_ALLOWANCE, SET_APPROVAL_FOR_ALL];

pub fn is_approval(selector: &[u8; 4]) -> bool {
    APPROVAL_SELECTORS.contains(selector)
}

fn word(data: &[u8], index: usize) -> Option<&[u8]> {
    let start = index.checked_mul(32)?.checked_add(4)?;
    data.get(start..start.checked_add(32)?)
}

/// ABI address argument `index` of `data`. `None` when the calldata is too
/// short or the word is not a clean 20-byte address.
pub fn address_argument(data: &[u8], index: usize) -> Option<Address> {
    let word = word(data, index)?;
    if word[..12].iter().any(|b| *b != 0) {
        return None;
    }
    Some(Address::from_slice(&word[12..]))
}

pub fn uint_argument(data: &[u8], index: usize) -> Option<U256> {
    word(data, index).map(U256::from_be_slice)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn selectors_match_known_values() {
        assert_eq!(TRANSFER, [0xa9, 0x05, 0x9c, 0xbb]);
        assert_eq!(APPROVE, [0x09, 0x5e, 0xa7, 0xb3]);
        assert_eq!(SET_APPROVAL_FOR_ALL, [0xa2, 0x2c, 0xb4, 0x65]);
        assert!(is_approval(&INCREASE_ALLOWANCE));
        assert!(!is_approval(&TRANSFER));
    }

    #[test]
    fn extracts_arguments_from_encoded_call() {
        let spender = Address::repeat_byte(0x42);
        let data = IERC20::approveCall {
            spender,
            amount: U256::from(1_000u64),
        }
        .abi_encode();

        assert_eq!(address_argument(&data, 0), Some(spender));
        assert_eq!(uint_argument(&data, 1), Some(U256::from(1_000u64)));
        assert_eq!(address_argument(&data, 2), None);
    }

    #[test]
    fn rejects_dirty_address_words() {
        let mut data = vec![0u8; 4 + 32];
        data[4] = 1;
        assert_eq!(address_argument(&data, 0), None);
        assert_eq!(address_argument(&data[..20], 0), None);
    }
}
