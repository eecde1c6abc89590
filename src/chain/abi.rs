//! Contract ABIs spoken over raw calldata.

alloy_sol_types::sol! {
    /// Minimal ERC-20 surface handled by the token ledger.
    interface IERC20 {
        function approve(address spender, uint256 amount) external returns (bool);
        function transfer(address to, uint256 amount) external returns (bool);
        function transferFrom(address from, address to, uint256 amount) external returns (bool);
        function balanceOf(address owner) external view returns (uint256);
        function allowance(address owner, address spender) external view returns (uint256);
    }

    /// Entry points of the conditional order manager reachable through hooks.
    interface IOrderManager {
        function executePreHookBySalt(address user, bytes32 salt) external;
        function executePostHookBySalt(address user, bytes32 salt) external;
        function fundOrderBySalt(address user, bytes32 salt, address token, uint256 amount) external;
        function fundOrderWithBalance(address user, bytes32 salt, address token) external;
        function isValidSignature(bytes32 hash, bytes signature) external view returns (bytes4);
    }

    /// ERC-1271 signature payload identifying a conditional order.
    #[derive(Debug, PartialEq, Eq)]
    struct ConditionalOrderParams {
        address handler;
        bytes32 salt;
        bytes staticInput;
    }
}
