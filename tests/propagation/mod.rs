mod propagators;
