use alloy::sol;

// uniswap v2 style router, only the swap entry point is needed
sol!(
    #[derive(Debug)]
    #[sol(rpc)]
    contract UniswapV2Router {
        function swapExactTokensForTokens(
            uint256 amountIn,
            uint256 amountOutMin,
            address[] calldata path,
            address to,
            uint256 deadline
        ) external returns (uint256[] memory amounts);
    }
);

// Pair contract to get reserves
sol!(
    #[derive(Debug)]
    #[sol(rpc)]
    contract UniswapV2Pair {
        function getReserves() external view returns (uint112 reserve0, uint112 reserve1, uint32 blockTimestampLast);
    }
);

sol!(
    #[derive(Debug)]
    contract ERC20 {
        event Transfer(address indexed from, address indexed to, uint256 value);
    }
);
